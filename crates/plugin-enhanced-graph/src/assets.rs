//! Frontend payloads injected into the shell page.

use notegraph_plugin::FrontendAssets;

const SCRIPT: &str = r#"// Enhanced graph view
document.addEventListener('alpine:init', () => {
    console.log('Enhanced Graph: initializing');
    window.enhancedGraphReady = true;
    console.log('Enhanced Graph: ready');
});
"#;

const STYLE: &str = r#"/* Enhanced graph view */
.graph-node-previewed {
    box-shadow: 0 0 20px rgba(59, 130, 246, 0.6) !important;
    border-width: 3px !important;
}

.graph-node-expandable::after {
    content: '+';
    position: absolute;
    top: -8px;
    right: -8px;
    background: var(--accent-primary);
    color: white;
    width: 20px;
    height: 20px;
    border-radius: 50%;
    display: flex;
    align-items: center;
    justify-content: center;
    font-size: 14px;
    font-weight: bold;
}
"#;

/// Script and style of the graph view.
pub fn frontend_assets() -> FrontendAssets {
    FrontendAssets {
        script: Some(SCRIPT.to_string()),
        style: Some(STYLE.to_string()),
    }
}

//! Dark theme shared by every page.

pub const PRIMARY: &str = "#6C63FF";
pub const SECONDARY: &str = "#FF6584";
pub const BACKGROUND: &str = "#121212";
pub const PAPER: &str = "#1E1E2E";

/// Stylesheet inlined into the page shell.
pub fn stylesheet() -> String {
    format!(
        r#"
:root {{
    --primary: {PRIMARY};
    --primary-light: #9D97FF;
    --primary-dark: #4B44CC;
    --secondary: {SECONDARY};
    --background: {BACKGROUND};
    --paper: {PAPER};
    --text-primary: #FFFFFF;
    --text-secondary: #B0B0C0;
    --error: #FF5252;
    --divider: rgba(255, 255, 255, 0.08);
    --brand-gradient: linear-gradient(45deg, #7C4DFF 30%, #FF4081 90%);
}}
* {{ box-sizing: border-box; }}
body {{
    margin: 0;
    min-height: 100vh;
    display: flex;
    flex-direction: column;
    background: var(--background);
    color: var(--text-primary);
    font-family: "Inter", "Roboto", "Helvetica", "Arial", sans-serif;
    line-height: 1.6;
}}
a {{ color: inherit; text-decoration: none; }}
.app-bar {{
    display: flex;
    align-items: center;
    justify-content: space-between;
    padding: 0.75rem 1.5rem;
    background: linear-gradient(180deg, rgba(20, 20, 40, 0.95) 0%, rgba(15, 15, 30, 0.95) 100%);
    border-bottom: 1px solid var(--divider);
}}
.brand {{
    font-size: 1.5rem;
    font-weight: 700;
    letter-spacing: -0.02em;
    background: var(--brand-gradient);
    -webkit-background-clip: text;
    -webkit-text-fill-color: transparent;
}}
.subtitle {{ color: var(--text-secondary); opacity: 0.8; }}
.button {{
    display: inline-block;
    border: none;
    border-radius: 8px;
    padding: 0.6rem 1.4rem;
    font-size: 1rem;
    font-weight: 600;
    cursor: pointer;
    color: #FFFFFF;
    background: var(--primary);
    transition: background 0.2s ease;
}}
.button:hover {{ background: var(--primary-dark); }}
.button:disabled {{ opacity: 0.5; cursor: not-allowed; }}
.button.ghost {{ background: rgba(108, 99, 255, 0.15); }}
.button.ghost:hover {{ background: rgba(108, 99, 255, 0.3); }}
.button.outlined {{ background: transparent; border: 1px solid var(--primary); }}
main {{ flex: 1; width: 100%; max-width: 1100px; margin: 0 auto; padding: 2rem 1.5rem; }}
footer {{
    text-align: center;
    padding: 1.5rem;
    border-top: 1px solid var(--divider);
    color: var(--text-secondary);
    font-size: 0.875rem;
}}
footer small {{ display: block; opacity: 0.6; margin-top: 0.25rem; }}
.hero h1 {{
    font-size: 3.5rem;
    margin: 0 0 1rem;
    background: var(--brand-gradient);
    -webkit-background-clip: text;
    -webkit-text-fill-color: transparent;
}}
.hero p {{ color: var(--text-secondary); font-size: 1.25rem; max-width: 600px; }}
.features {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 1.5rem; margin-top: 3rem; }}
.card {{
    padding: 1.5rem;
    border-radius: 12px;
    text-align: center;
    background: linear-gradient(135deg, var(--paper) 0%, rgba(30, 30, 60, 0.9) 100%);
    border: 1px solid rgba(255, 255, 255, 0.05);
    transition: transform 0.3s ease;
}}
.card:hover {{ transform: translateY(-8px); }}
.card p {{ color: var(--text-secondary); }}
.chat-log {{ display: flex; flex-direction: column; gap: 1rem; min-height: 50vh; }}
.welcome {{ text-align: center; color: var(--text-secondary); margin: 3rem auto; max-width: 500px; }}
.welcome .tip {{
    padding: 1rem;
    border-radius: 8px;
    font-style: italic;
    background: rgba(108, 99, 255, 0.05);
    border: 1px dashed rgba(108, 99, 255, 0.3);
}}
.message {{ padding: 1rem 1.25rem; border-radius: 12px; max-width: 85%; overflow-wrap: break-word; }}
.message.user {{ align-self: flex-end; background: var(--primary); white-space: pre-wrap; }}
.message.model {{ align-self: flex-start; background: var(--paper); border: 1px solid var(--divider); }}
.message.model .streaming {{ white-space: pre-wrap; }}
.loading {{ color: var(--text-secondary); font-weight: 500; }}
.composer {{ display: flex; gap: 0.75rem; margin-top: 1.5rem; }}
.composer textarea {{
    flex: 1;
    min-height: 48px;
    max-height: 200px;
    padding: 0.75rem 1rem;
    border-radius: 12px;
    border: 1px solid var(--divider);
    background: var(--paper);
    color: var(--text-primary);
    font: inherit;
    resize: vertical;
}}
.code-block {{ position: relative; margin: 1rem 0; }}
.code-block pre {{
    margin: 0;
    padding: 1rem;
    overflow-x: auto;
    border-radius: 8px;
    background: #0D0D1A;
    border: 1px solid var(--divider);
}}
.copy-button {{
    position: absolute;
    top: 0.5rem;
    right: 0.5rem;
    border: none;
    border-radius: 6px;
    cursor: pointer;
    background: rgba(255, 255, 255, 0.08);
    color: var(--text-primary);
}}
"#
    )
}

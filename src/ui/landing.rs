use super::html_shell;

const FEATURES: [(&str, &str, &str); 4] = [
    (
        "✨",
        "Smart Optimization",
        "Automatically enhance your prompts with an AI-powered optimization engine",
    ),
    (
        "⚡",
        "Faster Results",
        "Get better AI responses in less time with precisely crafted prompts",
    ),
    (
        "💻",
        "Code Generation",
        "Optimize prompts specifically for code generation and technical tasks",
    ),
    (
        "🧠",
        "Iterative Refinement",
        "Send feedback on each draft and the optimizer revises it in context",
    ),
];

/// Landing page.
pub fn page() -> String {
    let cards: String = FEATURES
        .iter()
        .map(|(icon, title, description)| {
            format!(
                r#"
            <div class="card">
                <div style="font-size: 2.5rem">{icon}</div>
                <h3>{title}</h3>
                <p>{description}</p>
            </div>"#
            )
        })
        .collect();

    let content = format!(
        r##"
    <section class="hero">
        <h1>Optimize Your AI Prompts</h1>
        <p>
            PEO.AI helps you craft better prompts for more effective AI interactions.
            Enhance your results with an advanced prompt engineering optimizer.
        </p>
        <a href="/chat" class="button">Get Started &rarr;</a>
        <a href="#features" class="button outlined">Learn More</a>
    </section>
    <section id="features">
        <h2 style="text-align: center; margin-top: 4rem">Why Choose PEO.AI?</h2>
        <div class="features">{cards}
        </div>
    </section>
    "##
    );

    html_shell("Home", &content)
}

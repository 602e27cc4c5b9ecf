// Triage a grievance from the command line.
//
//   cargo run --example triage -- "Water main burst on 5th Avenue" photo.jpg
//
// Reads HF_TOKEN and GROQ_API_KEY from the environment (or a .env file).
// Without them every stage still answers with its fallback result.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use grievance_triage::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let text = args.next().unwrap_or_else(|| {
        "Emergency: the drain outside the primary school is blocked and sewage is flooding the road"
            .to_string()
    });

    // Same rule the submission form applies
    let text = match validate_submission(text) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Rejected: {}", e);
            return Ok(());
        }
    };

    let mut images = Vec::new();
    for path in args {
        let bytes = std::fs::read(&path)?;
        images.push(STANDARD.encode(bytes));
    }

    let triage = from_env()?;
    let analysis = triage.analyze(&text, &images, None).await;
    let decision = triage.route(&analysis, &text, None);

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    println!(
        "\nRoute to {} ({}) with {} priority",
        decision.department, decision.category, decision.priority
    );
    Ok(())
}

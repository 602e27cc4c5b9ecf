// Offline routing: urgency, category suggestion and priority tiers.
//
// Runs without credentials; sentiment and image analysis are skipped.
use grievance_triage::prelude::*;
use tracing_subscriber::EnvFilter;

const GRIEVANCES: [&str; 5] = [
    "Garbage has not been collected for two weeks and the smell is unbearable",
    "Streetlight on Park Road not working, dangerous for women at night",
    "General inquiry about the new water supply timings",
    "Huge pothole caused an accident this morning, urgent repair needed",
    "Request to add more benches in the community library",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let triage = TriageClient::offline(TriageConfig::default());
    let no_images: [&str; 0] = [];

    for text in GRIEVANCES {
        let analysis = triage.analyze(text, &no_images, None).await;
        let decision = triage.route(&analysis, text, None);

        println!("{}", text);
        println!(
            "  urgency {:>2}  {:<14} -> {} [{}]",
            analysis.overall_urgency.value(),
            decision.category,
            decision.department,
            decision.priority
        );
    }

    // An explicit category from the submitter overrides the suggestion
    let text = GRIEVANCES[4];
    let analysis = triage.analyze(text, &no_images, None).await;
    let decision = triage.route(&analysis, text, Some(Category::Education));
    println!("\nWith category {}: {}", Category::Education.label(), decision.department);

    Ok(())
}

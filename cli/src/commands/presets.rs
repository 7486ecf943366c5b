use anyhow::Result;
use logitkit_core::Config;

pub fn execute() -> Result<()> {
    let config = Config::load()?;

    if config.presets.is_empty() {
        println!("No presets configured.");
        println!("\nRun `logitkit config presets.<name>.temperature <value>` to add one.");
        return Ok(());
    }

    println!("{:<20} {}", "NAME", "STRATEGIES");
    println!("{}", "-".repeat(60));

    for (name, profile) in &config.presets {
        let strategies: Vec<String> = profile.strategies().iter().map(|s| s.to_string()).collect();
        println!("{:<20} {}", name, strategies.join(" -> "));
    }

    Ok(())
}

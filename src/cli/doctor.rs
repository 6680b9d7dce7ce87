// src/cli/doctor.rs — Configuration sanity check

use crate::infra::config::Config;

pub fn run_doctor(config: &Config) -> anyhow::Result<()> {
    println!("storymill {}", env!("CARGO_PKG_VERSION"));
    println!("environment: {}", config.environment);

    match &config.provider.api_key {
        Some(_) => println!("provider key: configured"),
        None => println!("provider key: MISSING (set STORYMILL_OPENAI_KEY)"),
    }
    println!("provider url: {}", config.provider.base_url);
    println!("text model:   {}", config.provider.text_model);
    println!("image model:  {}", config.provider.image_model);
    println!("database url: {}", config.database.base_url);

    if !config.analytics.enabled {
        println!("analytics:    disabled");
    } else {
        match &config.analytics.endpoint {
            Some(endpoint) => println!("analytics:    delivering to {endpoint}"),
            None => println!("analytics:    no endpoint, events logged locally"),
        }
    }
    Ok(())
}

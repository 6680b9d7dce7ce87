// src/cli/collections.rs — Environment-collections diagnostic
//
// Answers "which collections will this process touch" before anything is
// written, so a misconfigured environment is caught by eye.

use crate::infra::config::Config;
use crate::store::collections::Collections;

pub fn run_collections(config: &Config) {
    let collections = Collections::for_env(config.environment);
    println!("environment: {}", config.environment);
    println!("collections:");
    for name in collections.all() {
        println!("  {name}");
    }
}

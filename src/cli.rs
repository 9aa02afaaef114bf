//! Interactive read-eval loop: one query at a time on stdin, `cancel`
//! (case-insensitive) exits. Direct SQL is executed and printed as JSON;
//! everything else prints the assembled prompt followed by the backend's
//! response. A failed catalog fetch or SQL statement is reported and the
//! loop continues.

use std::io::{self, Write};

use tracing::{error, info};

use crate::catalog::Catalog;
use crate::intent::{self, Response};
use crate::llm::LlmClient;
use crate::metadata::{self, Metadata};

pub async fn run(catalog: &Catalog, md: &Metadata, llm: &LlmClient) -> anyhow::Result<()> {
    info!("metadata ready: {} tables", md.len());
    println!("Collected metadata for {} tables:", md.len());
    let names = metadata::summarize(md);
    println!(
        "{}",
        serde_json::to_string_pretty(&names).unwrap_or_else(|_| "[]".to_string())
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    println!("\nEnter a natural language query or SQL query (type 'cancel' to exit).");
    loop {
        input.clear();
        print!("> ");
        let _ = stdout.flush();
        if stdin.read_line(&mut input).is_err() {
            break;
        }
        if input.is_empty() {
            // EOF
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("cancel") {
            println!("Operation cancelled.");
            break;
        }

        match intent::classify(line, md, catalog).await {
            Ok(Response::Sql(sql)) => {
                println!("\nExecuting SQL query directly on the database...");
                match catalog.execute_sql(&sql).await {
                    Ok(Some(rows)) => {
                        let pretty = serde_json::to_string_pretty(&rows)
                            .unwrap_or_else(|_| rows.to_string());
                        println!("{}", pretty);
                    }
                    Ok(None) => println!("Statement executed; no result set."),
                    Err(e) => error!("sql execution failed: {}", e),
                }
            }
            Ok(Response::Prompt(prompt)) => {
                println!("\nFull prompt to the generation backend:");
                println!("{}", prompt);
                let response = llm.generate(&prompt).await;
                println!("\nResponse:");
                println!("{}", response);
            }
            Err(e) => error!("query handling failed: {}", e),
        }
    }
    Ok(())
}

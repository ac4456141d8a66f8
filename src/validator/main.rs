//! Standalone validator for the guard bot configuration files.
//!
//! Checks the greeting questions YAML and the notification templates JSON,
//! reporting every entry the bot would skip or reject.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

// Import from the main crate
use newbie_guard_bot::config::NotificationTemplates;
use newbie_guard_bot::greeting::{EXAMPLE_QUESTIONS, MENTION_PLACEHOLDER, QuestionCatalog};
use newbie_guard_bot::notification::TemplateCategory;

/// Guard bot configuration validator.
#[derive(Parser, Debug)]
#[command(name = "validate_config")]
#[command(about = "Validates greeting questions and notification templates")]
#[command(version)]
struct Args {
    /// Path to the greeting questions YAML file.
    #[arg(short, long, default_value = "greeting_questions.yaml")]
    questions: PathBuf,

    /// Path to the notification templates JSON file.
    #[arg(short, long, default_value = "notifications.json")]
    templates: PathBuf,

    /// Write example files into the given directory and exit.
    #[arg(long)]
    generate_example: Option<PathBuf>,

    /// Show detailed information for each entry.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Handle example generation
    if let Some(dir) = args.generate_example {
        return generate_example(&dir);
    }

    let questions_ok = validate_questions(&args.questions, args.verbose);
    println!();
    let templates_ok = validate_templates(&args.templates, args.verbose);

    if questions_ok && templates_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn generate_example(dir: &Path) -> ExitCode {
    let questions_path = dir.join("greeting_questions.example.yaml");
    let templates_path = dir.join("notifications.example.json");

    if let Err(e) = std::fs::write(&questions_path, EXAMPLE_QUESTIONS) {
        eprintln!("✗ Failed to write {}: {e}", questions_path.display());
        return ExitCode::FAILURE;
    }
    if let Err(e) = NotificationTemplates::example().save_to_file(&templates_path) {
        eprintln!("✗ Failed to write {}: {e}", templates_path.display());
        return ExitCode::FAILURE;
    }

    println!("✓ Example questions written to: {}", questions_path.display());
    println!("✓ Example templates written to: {}", templates_path.display());
    ExitCode::SUCCESS
}

fn validate_questions(path: &Path, verbose: bool) -> bool {
    println!("Validating questions: {}", path.display());

    let entries = match QuestionCatalog::inspect(path) {
        Ok(entries) => entries,
        Err(e) => {
            println!("✗ Questions file is unusable: {e}");
            println!("  The bot would fall back to its built-in question.");
            return false;
        }
    };

    let mut errors = 0;
    let mut warnings = 0;

    for (index, entry) in entries.iter().enumerate() {
        match entry {
            Ok(question) => {
                if verbose {
                    println!(
                        "[{}] \"{}\" ({} options, {}s)",
                        question.name(),
                        truncate(question.text(), 40),
                        question.options().len(),
                        question.timeout().as_secs()
                    );
                }
                if !question.text().contains(MENTION_PLACEHOLDER) {
                    warnings += 1;
                    if verbose {
                        println!("  ⚠ Warning: text does not mention the newcomer");
                    }
                } else if verbose {
                    println!("  ✓ OK");
                }
            }
            Err(e) => {
                errors += 1;
                println!("  ✗ Entry #{index} skipped: {e}");
            }
        }
    }

    let total = entries.len();
    let valid = total - errors;

    if valid == 0 {
        println!("✗ No valid questions; the bot would use its built-in question");
        false
    } else if errors == 0 {
        println!("✓ All {total} questions are valid!");
        if warnings > 0 {
            println!("  ({warnings} warning(s) - questions without {MENTION_PLACEHOLDER})");
        }
        true
    } else {
        println!("✗ Validation failed: {errors} of {total} questions would be skipped");
        println!("  Valid: {valid}/{total}");
        false
    }
}

fn validate_templates(path: &Path, verbose: bool) -> bool {
    println!("Validating templates: {}", path.display());

    let templates = match NotificationTemplates::load_from_file(path) {
        Ok(templates) => templates,
        Err(e) => {
            println!("✗ Failed to load templates: {e}");
            return false;
        }
    };

    if verbose {
        for category in TemplateCategory::ALL {
            println!(
                "[{category}] {} templates, fields: {}",
                templates.get(category).len(),
                category.fields().join(", ")
            );
        }
    }

    let errors: Vec<_> = templates
        .validate_all()
        .into_iter()
        .filter_map(Result::err)
        .collect();

    for e in &errors {
        println!("  ✗ Error: {e}");
    }

    if errors.is_empty() {
        println!("✓ All {} templates are valid!", templates.len());
        true
    } else {
        println!("✗ Validation failed: {} error(s)", errors.len());
        false
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}

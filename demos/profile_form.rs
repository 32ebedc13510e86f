//! Profile form walkthrough.
//!
//! This demo shows a profile screen built on a secure form:
//! 1. Seed the form from account data
//! 2. Submit invalid edits and read the field errors
//! 3. Submit markup-laden edits and see what the handler receives
//! 4. Exhaust the shared rate limit
//!
//! Run with: `cargo run --example profile_form`

use std::sync::Arc;

use secure_form::{
    display_name, profile_form_config, InitialProfile, Notice, Notifier, Preferences,
    ProfileSaver, RateLimiter, SecureForm, SubmitReport,
};

/// Prints notices instead of showing toasts
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        println!("  [notice] {}", notice);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    println!("=== Profile Form Demo ===\n");

    let initial = InitialProfile::default();
    let limiter = Arc::new(RateLimiter::new());
    let form = SecureForm::new(
        profile_form_config(&initial)?,
        Arc::clone(&limiter),
        ProfileSaver::new(ConsoleNotifier),
    );
    println!(
        "Editing profile of {} (member since {})",
        display_name(&form, &initial),
        initial.join_date
    );

    // Step 1: invalid edits
    println!("\n1. Submitting an empty name and a malformed email...");
    form.update_field("name", "");
    form.update_field("email", "alex.johnson");
    let report = form.submit().await;
    println!("  Result: {:?}", report);
    for (field, error) in form.errors() {
        println!("  {}: {}", field, error);
    }

    // Step 2: markup in free text
    println!("\n2. Submitting edits that carry markup...");
    form.update_field("name", "Alex <script>alert('x')</script>Johnson");
    form.update_field("email", "alex.johnson@email.com");
    form.update_field("bio", "<b>Rustacean</b> <img src=x onerror=alert(1)>");
    let report = form.submit().await;
    println!("  Result: {:?}", report);
    println!("  Header shows: {}", display_name(&form, &initial));

    // Step 3: rate limit
    println!("\n3. Saving repeatedly...");
    loop {
        match form.submit().await {
            SubmitReport::RateLimited => {
                if let Some(error) = form.form_error() {
                    println!("  Blocked: {}", error);
                }
                break;
            }
            SubmitReport::Submitted => println!("  Result: Submitted"),
            other => {
                println!("  Result: {:?}", other);
                break;
            }
        }
    }

    println!("\n4. Saving preferences...");
    let prefs = Preferences {
        weekly_digest: false,
        ..Preferences::default()
    };
    let saved = prefs.save(&ConsoleNotifier);
    println!("  Saved: {:?}", saved);

    println!("\n=== Demo Complete ===");
    Ok(())
}

//! Integration tests for the account profile screen.
//!
//! These tests drive the profile form the way a view would: seeded from
//! account data, edited, submitted, and confirmed through a notifier.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use secure_form::{
    display_name, profile_form_config, sign_out, Authentication, FormError, InitialProfile,
    ManualClock, Notice, Notifier, Preferences, ProfileSaver, RateLimiter, SecureForm,
    SubmitReport, PROFILE_RATE_LIMIT_KEY,
};

#[derive(Default)]
struct Toasts {
    shown: RefCell<Vec<Notice>>,
}

impl Notifier for Toasts {
    fn notify(&self, notice: Notice) {
        self.shown.borrow_mut().push(notice);
    }
}

struct Session {
    signed_in: Cell<bool>,
}

impl Authentication for Session {
    fn is_authenticated(&self) -> bool {
        self.signed_in.get()
    }

    fn sign_out(&self) {
        self.signed_in.set(false);
    }
}

fn profile_form(
    limiter: Arc<RateLimiter>,
    toasts: Rc<Toasts>,
) -> SecureForm<ProfileSaver<Rc<Toasts>>> {
    let config = profile_form_config(&InitialProfile::default()).expect("valid config");
    SecureForm::new(config, limiter, ProfileSaver::new(toasts))
}

#[tokio::test]
async fn edit_and_save_profile() {
    let toasts = Rc::new(Toasts::default());
    let form = profile_form(Arc::new(RateLimiter::new()), Rc::clone(&toasts));

    form.update_field("name", "Alex <b>J.</b>");
    form.update_field("bio", "Learning Rust.\nLikes <script>alert(1)</script>parsers.");

    assert_eq!(form.submit().await, SubmitReport::Submitted);
    assert_eq!(
        display_name(&form, &InitialProfile::default()),
        "Alex J."
    );

    let shown = toasts.shown.borrow();
    assert_eq!(shown.len(), 1);
    assert_eq!(
        shown[0].to_string(),
        "Profile Updated: Your profile information has been saved securely."
    );
}

#[tokio::test]
async fn clearing_required_fields_blocks_save() {
    let toasts = Rc::new(Toasts::default());
    let form = profile_form(Arc::new(RateLimiter::new()), Rc::clone(&toasts));

    form.update_field("name", "");
    form.update_field("email", "");
    form.update_field("phone", "call me");

    assert_eq!(form.submit().await, SubmitReport::Invalid);

    let errors = form.errors();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors["name"].message(), "required");
    assert_eq!(errors["email"].message(), "required");
    assert_eq!(errors["phone"].message(), "invalid format");
    assert!(toasts.shown.borrow().is_empty());
}

#[tokio::test]
async fn optional_fields_may_be_cleared() {
    let toasts = Rc::new(Toasts::default());
    let form = profile_form(Arc::new(RateLimiter::new()), toasts);

    form.update_field("phone", "");
    form.update_field("location", "");
    form.update_field("bio", "");

    assert_eq!(form.submit().await, SubmitReport::Submitted);
}

#[tokio::test]
async fn repeated_saves_are_rate_limited_across_screens() {
    let clock = ManualClock::default();
    let limiter = Arc::new(RateLimiter::with_clock(clock.clone()));
    let toasts = Rc::new(Toasts::default());

    for _ in 0..5 {
        let form = profile_form(Arc::clone(&limiter), Rc::clone(&toasts));
        assert_eq!(form.submit().await, SubmitReport::Submitted);
    }

    clock.advance(Duration::from_secs(20));
    let form = profile_form(Arc::clone(&limiter), Rc::clone(&toasts));
    assert_eq!(form.submit().await, SubmitReport::RateLimited);
    assert_eq!(
        form.form_error(),
        Some(FormError::RateLimited {
            retry_after: Duration::from_secs(40)
        })
    );
    assert_eq!(
        form.form_error().map(|e| e.to_string()).as_deref(),
        Some("too many attempts, try again in 40s")
    );
    assert_eq!(toasts.shown.borrow().len(), 5);
    assert_eq!(
        limiter.entry(PROFILE_RATE_LIMIT_KEY).map(|e| e.count),
        Some(6)
    );
}

#[test]
fn preferences_and_sign_out() {
    let toasts = Toasts::default();
    let prefs = Preferences {
        push_notifications: true,
        ..Preferences::default()
    };

    let saved = prefs.save(&toasts);
    assert!(saved.push_notifications);
    assert_eq!(toasts.shown.borrow()[0].title, "Preferences Updated");

    let session = Session {
        signed_in: Cell::new(true),
    };
    sign_out(&session);
    assert!(!session.is_authenticated());
}

use clap::Args;
use std::sync::Arc;
use venue_market::config::AppEnvironment;
use venue_market::error::AppError;
use venue_market::identity::{Actor, Role};
use venue_market::store::{MemoryStore, ReviewFault};
use venue_market::workflows::accounts::{seed_dev_users, AccountService, DEV_ADMIN_EMAIL};
use venue_market::workflows::host_applications::{
    HostApplicationService, HostApplicationSubmission, ReviewRequest, SubmissionGuard,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Fail the first approval attempt to show that the review rolls back.
    #[arg(long)]
    pub(crate) simulate_failure: bool,
    /// Reject the application instead of approving it.
    #[arg(long)]
    pub(crate) reject: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        simulate_failure,
        reject,
    } = args;

    let store = Arc::new(MemoryStore::new());
    let seeded = seed_dev_users(store.as_ref(), AppEnvironment::Development).await?;
    let admin = seeded
        .iter()
        .find(|user| user.email == DEV_ADMIN_EMAIL)
        .map(|user| Actor::new(user.id, user.role));
    let applicant = store.insert_user("guest@yourplace.dev", Role::User).await;
    let applicant = Actor::new(applicant.id, applicant.role);

    let host_applications = HostApplicationService::new(Arc::clone(&store));
    let accounts = AccountService::new(Arc::clone(&store));

    println!("Host onboarding demo");
    println!("  Applicant: user #{} ({})", applicant.id, applicant.role);

    let submission = HostApplicationSubmission {
        offering_type: "both".to_string(),
        space_types: Some(vec!["studio".to_string()]),
        categories: vec!["movement".to_string()],
        capacity: 10,
        notes: Some("Evening dance workshops".to_string()),
    };
    let application = match SubmissionGuard.validate_submission(submission) {
        Ok(application) => application,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };

    let pending = match host_applications
        .submit(Some(&applicant), application.clone())
        .await
    {
        Ok(pending) => pending,
        Err(err) => {
            println!("  Submission failed: {}", err);
            return Ok(());
        }
    };
    println!(
        "  Submitted application #{} ({}, capacity {}) -> {}",
        pending.id,
        pending.offering_type.label(),
        pending.capacity,
        pending.status
    );

    match host_applications.submit(Some(&applicant), application).await {
        Ok(duplicate) => println!("  Unexpected second application #{}", duplicate.id),
        Err(err) => println!("  Second submission refused ({}): {}", err.kind().code(), err),
    }

    let Some(admin) = admin else {
        println!("  No admin account seeded; skipping review");
        return Ok(());
    };

    let decision = if reject { "rejected" } else { "approved" };
    let command = match SubmissionGuard.validate_review(ReviewRequest {
        status: decision.to_string(),
        review_notes: Some("Reviewed from the demo".to_string()),
    }) {
        Ok(command) => command,
        Err(err) => {
            println!("  Review rejected: {}", err);
            return Ok(());
        }
    };

    if simulate_failure {
        store.inject_review_fault(ReviewFault::RoleWrite).await;
        match host_applications
            .review(Some(&admin), pending.id, command.clone())
            .await
        {
            Ok(reviewed) => println!("  Review unexpectedly succeeded: {}", reviewed.status),
            Err(err) => println!("  Review failed and was rolled back: {}", err),
        }
        if let Ok(current) = host_applications.get_latest(Some(&applicant)).await {
            println!("  Application #{} is still {}", current.id, current.status);
        }
    }

    match host_applications
        .review(Some(&admin), pending.id, command.clone())
        .await
    {
        Ok(reviewed) => println!(
            "  Admin #{} recorded '{}' on application #{}",
            admin.id, reviewed.status, reviewed.id
        ),
        Err(err) => println!("  Review failed: {}", err),
    }

    match host_applications
        .review(Some(&admin), pending.id, command)
        .await
    {
        Ok(_) => println!("  Unexpected second review"),
        Err(err) => println!("  Second review refused ({}): {}", err.kind().code(), err),
    }

    match accounts.me(Some(&applicant)).await {
        Ok(profile) => println!("  Applicant role is now {}", profile.role),
        Err(err) => println!("  Profile unavailable: {}", err),
    }

    Ok(())
}

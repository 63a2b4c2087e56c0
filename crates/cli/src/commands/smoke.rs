use std::time::Instant;

use opsdesk_core::config::{AppConfig, LoadOptions};
use opsdesk_core::{
    ApprovalEngine, ApprovalEvent, ChainState, FinanceChain, InMemoryAuditSink, LeaveChain, Role,
    UserId,
};
use opsdesk_store::{FileSessionStore, SessionRecord, SessionStore};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("session_store_round_trip"));
            checks.push(skipped("leave_chain"));
            checks.push(skipped("finance_chain"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    checks.push(check_session_store(&config));
    checks.push(check_leave_chain());
    checks.push(check_finance_chain());

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// Writes, reads back, and clears a throwaway session under the
/// configured directory.
fn check_session_store(config: &AppConfig) -> SmokeCheck {
    let started = Instant::now();
    let store = FileSessionStore::new(config.session.dir.join("smoke"));
    let record = SessionRecord {
        user_id: UserId("u-smoke".to_owned()),
        username: "smoke".to_owned(),
        role: Role::Employee,
        logged_in_at: chrono::Utc::now(),
    };

    let result = store
        .save(&record)
        .and_then(|()| store.load())
        .and_then(|loaded| {
            store.clear()?;
            Ok(loaded)
        });

    match result {
        Ok(Some(loaded)) if loaded == record => SmokeCheck {
            name: "session_store_round_trip",
            status: SmokeStatus::Pass,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: format!("session file round-tripped under `{}`", config.session.dir.display()),
        },
        Ok(_) => SmokeCheck {
            name: "session_store_round_trip",
            status: SmokeStatus::Fail,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: "session read back did not match what was written".to_string(),
        },
        Err(error) => SmokeCheck {
            name: "session_store_round_trip",
            status: SmokeStatus::Fail,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: error.to_string(),
        },
    }
}

/// Coordinator-then-HR happy path, plus the cancellation window.
fn check_leave_chain() -> SmokeCheck {
    let started = Instant::now();
    let engine = ApprovalEngine::new(LeaveChain);
    let sink = InMemoryAuditSink::default();

    let result = (|| {
        let first = engine.apply_with_audit(
            "LR-smoke",
            &engine.initial_state(),
            &ApprovalEvent::FirstApprove {
                actor: UserId("u-cora".to_owned()),
                actor_role: Role::ProjectCoordinator,
                comments: None,
            },
            &sink,
        )?;
        let second = engine.apply_with_audit(
            "LR-smoke",
            &first.to,
            &ApprovalEvent::FinalApprove {
                actor: UserId("u-hana".to_owned()),
                actor_role: Role::HrManager,
                comments: None,
            },
            &sink,
        )?;
        Ok::<ChainState, opsdesk_core::ApprovalTransitionError>(second.to)
    })();

    let cancel_refused = engine
        .apply(
            &ChainState::FinalApproved,
            &ApprovalEvent::Cancel { actor: UserId("u-dana".to_owned()) },
        )
        .is_err();

    match result {
        Ok(ChainState::FinalApproved) if cancel_refused => SmokeCheck {
            name: "leave_chain",
            status: SmokeStatus::Pass,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: "coordinator then HR settles; settled requests refuse cancellation"
                .to_string(),
        },
        Ok(state) => SmokeCheck {
            name: "leave_chain",
            status: SmokeStatus::Fail,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: format!("unexpected terminal state {state:?} or cancellation accepted"),
        },
        Err(error) => SmokeCheck {
            name: "leave_chain",
            status: SmokeStatus::Fail,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: error.to_string(),
        },
    }
}

/// GM-then-admin happy path, plus the out-of-order refusal.
fn check_finance_chain() -> SmokeCheck {
    let started = Instant::now();
    let engine = ApprovalEngine::new(FinanceChain);
    let sink = InMemoryAuditSink::default();

    let out_of_order_refused = engine
        .apply(
            &ChainState::Pending,
            &ApprovalEvent::FinalApprove {
                actor: UserId("u-admin".to_owned()),
                actor_role: Role::Admin,
                comments: None,
            },
        )
        .is_err();

    let result = (|| {
        let first = engine.apply_with_audit(
            "TXN-smoke",
            &engine.initial_state(),
            &ApprovalEvent::FirstApprove {
                actor: UserId("u-grace".to_owned()),
                actor_role: Role::GeneralManager,
                comments: None,
            },
            &sink,
        )?;
        let second = engine.apply_with_audit(
            "TXN-smoke",
            &first.to,
            &ApprovalEvent::FinalApprove {
                actor: UserId("u-admin".to_owned()),
                actor_role: Role::Admin,
                comments: None,
            },
            &sink,
        )?;
        Ok::<ChainState, opsdesk_core::ApprovalTransitionError>(second.to)
    })();

    match result {
        Ok(ChainState::FinalApproved) if out_of_order_refused => SmokeCheck {
            name: "finance_chain",
            status: SmokeStatus::Pass,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: "GM then admin settles; admin cannot jump the queue".to_string(),
        },
        Ok(state) => SmokeCheck {
            name: "finance_chain",
            status: SmokeStatus::Fail,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: format!("unexpected terminal state {state:?} or ordering not enforced"),
        },
        Err(error) => SmokeCheck {
            name: "finance_chain",
            status: SmokeStatus::Fail,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: error.to_string(),
        },
    }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}

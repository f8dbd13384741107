//! `watch` command: follow push updates until Ctrl+C.

use anyhow::{Result, bail};

use crate::apply::{ApplyError, ApplyReport};
use crate::core::ShutdownSignal;
use crate::dom::Document;
use crate::lifecycle::LifecycleExit;
use crate::logger::{status_error, status_success, status_warning};
use crate::runtime::Runtime;

pub async fn watch(runtime: &Runtime<Document>, shutdown: ShutdownSignal) -> Result<()> {
    let exit = runtime.run_push_with(shutdown, report_update).await?;

    match exit {
        LifecycleExit::Shutdown => {
            crate::log!("push"; "stopped");
            Ok(())
        }
        LifecycleExit::AttemptsExhausted => bail!("push server unreachable, giving up"),
    }
}

fn report_update(outcome: &Result<ApplyReport, ApplyError>) {
    match outcome {
        Ok(report) if report.is_clean() => {
            status_success(&format!("applied {}", describe(&report.applied)));
        }
        Ok(report) => {
            let skipped: Vec<&str> = report.skipped_targets().collect();
            status_warning(&format!(
                "applied {}, skipped {}",
                describe(&report.applied),
                skipped.join(", ")
            ));
        }
        Err(e) => status_error("update rejected", &e.to_string()),
    }
}

fn describe(targets: &[String]) -> String {
    match targets {
        [] => "no changes".to_string(),
        [one] => format!("`{one}`"),
        many => format!("{} targets", many.len()),
    }
}

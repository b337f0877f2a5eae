use foundry_core::ledger::UsageLedger;

use crate::error::AdvisorError;

/// Charge one completed model call to the ledger, if there is one.
pub(crate) fn record(
    ledger: Option<&UsageLedger>,
    model: &str,
    prompt: &str,
    reply: &str,
) -> Result<(), AdvisorError> {
    let Some(ledger) = ledger else {
        return Ok(());
    };
    let usage = ledger.track(model, prompt, reply)?;
    tracing::debug!(model, tokens = usage.tokens, cost = usage.cost, "Recorded usage");
    Ok(())
}

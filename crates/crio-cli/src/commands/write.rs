//! Write commands - setpoints, data logging, PID configuration

use anyhow::{bail, Context, Result};
use crio_client::{ControllerBackend, PidConfiguration, Setpoint, SetpointValue};

use crate::output::OutputContext;

/// Write one setpoint
pub async fn set(
    backend: &dyn ControllerBackend,
    tag: &str,
    value: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let setpoint = Setpoint::new(tag, parse_value(value)?);
    backend
        .set_setpoint(&setpoint)
        .await
        .with_context(|| format!("Failed to set {tag}"))?;

    ctx.success(&format!("Set {} = {}", tag, setpoint.value()));
    Ok(())
}

/// Write several setpoints in one request
pub async fn set_many(
    backend: &dyn ControllerBackend,
    assignments: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    let setpoints = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>>>()?;

    backend
        .set_multiple_setpoints(&setpoints)
        .await
        .context("Failed to set setpoints")?;

    ctx.success(&format!("Set {} setpoint(s)", setpoints.len()));
    Ok(())
}

/// Switch controller data logging
pub async fn logging(backend: &dyn ControllerBackend, on: bool, ctx: &OutputContext) -> Result<()> {
    backend
        .switch_data_logging(on)
        .await
        .context("Failed to switch data logging")?;

    ctx.success(&format!(
        "Data logging switched {}",
        if on { "on" } else { "off" }
    ));
    Ok(())
}

/// Configure a PID controller
pub async fn pid(
    backend: &dyn ControllerBackend,
    controller: &str,
    pv: &str,
    cv: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let configuration = PidConfiguration::new(controller, pv, cv);
    backend
        .configure_pid_controller(&configuration)
        .await
        .with_context(|| format!("Failed to configure {controller}"))?;

    ctx.success(&format!("{controller} now controls {cv} from {pv}"));
    Ok(())
}

/// Parse a numeric setpoint, keeping integers integral
fn parse_value(value: &str) -> Result<SetpointValue> {
    if let Ok(int) = value.parse::<i64>() {
        return Ok(SetpointValue::from(int));
    }
    match value.parse::<f64>() {
        Ok(float) if float.is_finite() => Ok(SetpointValue::from(float)),
        _ => bail!("Setpoint value '{value}' is not a finite number"),
    }
}

/// Parse `TAG=VALUE`; the tag may contain '=' up to the last one
fn parse_assignment(assignment: &str) -> Result<Setpoint> {
    let Some((tag, value)) = assignment.rsplit_once('=') else {
        bail!("Expected TAG=VALUE, got '{assignment}'");
    };
    let tag = tag.trim();
    if tag.is_empty() {
        bail!("Missing tag in '{assignment}'");
    }
    Ok(Setpoint::new(tag, parse_value(value.trim())?))
}

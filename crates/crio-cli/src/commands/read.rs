//! Read commands - current data, alarms, system information

use anyhow::Result;
use crio_client::ControllerBackend;

use crate::output::{format_value, OutputContext, OutputFormat, TagRow};

/// Show the latest value and unit of every tag
pub async fn current(backend: &dyn ControllerBackend, ctx: &OutputContext) -> Result<()> {
    let data = backend.get_current_data().await?;

    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let rows: Vec<TagRow> = data
        .tags()
        .map(|tag| TagRow {
            tag: tag.to_string(),
            value: data.value(tag).map(format_value).unwrap_or_default(),
            unit: data.unit(tag).unwrap_or_default().to_string(),
        })
        .collect();

    ctx.print(&rows);
    if ctx.format == OutputFormat::Table {
        if let Some(timestamp) = data.timestamp() {
            ctx.info(&format!("Controller time: {}", format_value(timestamp)));
        }
    }
    Ok(())
}

/// Show the controller's alarm information
pub async fn alarms(backend: &dyn ControllerBackend, ctx: &OutputContext) -> Result<()> {
    let alarms = backend.get_alarm_information().await?;
    ctx.print_object(&alarms);
    Ok(())
}

/// Show the controller's system information
pub async fn system(backend: &dyn ControllerBackend, ctx: &OutputContext) -> Result<()> {
    let info = backend.get_system_information().await?;
    ctx.print_object(&info);
    Ok(())
}

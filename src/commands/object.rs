//! Single-object commands: read, reset, types

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use dialoguer::Confirm;
use permissions::{IdentifierField, ObjectRef, ObjectType};

use crate::Context;
use crate::ui;

pub fn read(ctx: &Context, object: &str, json: bool) -> Result<()> {
    ObjectRef::parse(object)?;
    let client = super::connect(ctx)?;
    let caller = client.me().context("Could not identify the calling user")?;

    let Some(entity) = client.read(&caller, object)? else {
        ui::warn(&format!("{object} does not exist"));
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entity)?);
        return Ok(());
    }

    ui::header(object);
    ui::kv("type", &entity.object_type.to_string());
    if entity.access_control.is_empty() {
        ui::dim("no direct grants besides yours");
    }
    for change in &entity.access_control {
        println!(
            "  {:<40} {}",
            change.principal.to_string(),
            change.permission_level.cyan()
        );
    }
    Ok(())
}

pub fn reset(ctx: &Context, object: &str, yes: bool) -> Result<()> {
    let parsed = ObjectRef::parse(object)?;
    let client = super::connect(ctx)?;

    if !yes {
        let owner = if parsed.object_type.has_owner() {
            " and its creator"
        } else {
            ""
        };
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove every grant on {object} except administrators{owner}?"))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            ui::warn("Cancelled");
            return Ok(());
        }
    }

    client.delete(object)?;
    if !ctx.quiet {
        ui::success(&format!("Reset {object}"));
    }
    Ok(())
}

/// One row of the `types` listing
fn describe(field: IdentifierField, object_type: ObjectType, value: Option<&str>) -> String {
    let key = match value {
        Some(value) => format!("{field} = \"{value}\""),
        None => field.to_string(),
    };
    format!(
        "{:<32} {:<22} {:<6} {}",
        key,
        object_type.name(),
        object_type.write_method().to_string(),
        ObjectRef::new(object_type, value.unwrap_or("<id>")).endpoint()
    )
}

pub fn types() -> Result<()> {
    ui::header("Supported objects");
    for field in IdentifierField::ALL {
        if field == IdentifierField::Authorization {
            for value in ["tokens", "passwords"] {
                let object_type = field.object_type(value)?;
                println!("  {}", describe(field, object_type, Some(value)));
            }
        } else {
            let object_type = field.object_type("")?;
            println!("  {}", describe(field, object_type, None));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_sql_endpoint() {
        let row = describe(IdentifierField::SqlEndpointId, ObjectType::SqlEndpoint, None);
        assert!(row.starts_with("sql_endpoint_id"));
        assert!(row.contains("PATCH"));
    }

    #[test]
    fn test_describe_tokens() {
        let row = describe(
            IdentifierField::Authorization,
            ObjectType::Tokens,
            Some("tokens"),
        );
        assert!(row.contains("authorization = \"tokens\""));
        assert!(row.contains("/api/2.0/permissions/authorization/tokens"));
    }

    #[test]
    fn test_types_lists_every_field() {
        assert!(types().is_ok());
    }
}

use chrono::{DateTime, Utc};
use kvmigrate::{Definition, MigrationSetRegistration, ProviderContext};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

const COLLECTION: &str = "example-records";

/// Document written by the first example migration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExampleRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl ExampleRecord {
    fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Newest first.
fn example_definitions(ctx: &ProviderContext) -> Vec<Definition> {
    let ctx = ctx.clone();
    vec![Definition::new("#1 example migration", move || {
        let ctx = ctx.clone();
        async move { create_example_record(&ctx).await }
    })]
}

async fn create_example_record(ctx: &ProviderContext) -> anyhow::Result<()> {
    let record = ExampleRecord::new();
    let key = ctx.document_key(COLLECTION, &record.id);
    let payload = serde_json::to_string(&record)?;

    let mut conn = ctx.client().get_multiplexed_async_connection().await?;
    let _: () = conn.set(&key, payload).await?;

    log::info!("created example record {key}");
    Ok(())
}

inventory::submit! {
    MigrationSetRegistration {
        name: "example",
        description: "Seeds one example record under <prefix>:example-records",
        definitions: example_definitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_set_has_one_definition() {
        let client = redis::Client::open("redis://127.0.0.1/").unwrap();
        let ctx = ProviderContext::new(client, "app");
        let defs = example_definitions(&ctx);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name(), "#1 example migration");
    }

    #[test]
    fn example_record_serializes_id_and_timestamp() {
        let record = ExampleRecord::new();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], record.id);
        assert!(json["created_at"].is_string());
        assert_eq!(uuid::Uuid::parse_str(&record.id).unwrap().get_version_num(), 4);
    }
}

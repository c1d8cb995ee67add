use crate::library::communication::event::{
    EntryFields, IndexDefinition, IndexFieldKind, MaterializationSink,
};
use crate::library::EmptyResult;
use async_trait::async_trait;
use futures::lock::Mutex;
use redis::aio::ConnectionLike;
use redis::{AsyncCommands, Cmd};

/// Sink writing records into redis hashes
pub struct RedisSink<C> {
    con: Mutex<C>,
}

impl<C> RedisSink<C>
where
    C: ConnectionLike + Send,
{
    /// Creates a new instance taking ownership of a connection
    pub fn new(con: C) -> Self {
        Self {
            con: Mutex::new(con),
        }
    }
}

/// Builds a `FT.CREATE` command indexing hashes below the definition's prefix
fn index_command(definition: &IndexDefinition) -> Cmd {
    let mut cmd = redis::cmd("FT.CREATE");

    cmd.arg(&definition.name)
        .arg("ON")
        .arg("HASH")
        .arg("PREFIX")
        .arg(1)
        .arg(&definition.prefix)
        .arg("SCHEMA");

    for field in definition.fields.iter() {
        cmd.arg(&field.name);

        match field.kind {
            IndexFieldKind::Text { weight } => cmd.arg("TEXT").arg("WEIGHT").arg(weight),
            IndexFieldKind::Tag => cmd.arg("TAG"),
        };
    }

    cmd
}

#[async_trait]
impl<C> MaterializationSink for RedisSink<C>
where
    C: ConnectionLike + Send,
{
    async fn upsert_fields(&self, key: &str, fields: &EntryFields) -> EmptyResult {
        // HSET requires at least one field-value pair
        if fields.is_empty() {
            return Ok(());
        }

        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect();

        let mut con = self.con.lock().await;
        con.hset_multiple::<_, _, _, ()>(key, &items[..]).await?;

        Ok(())
    }

    async fn create_index(&self, definition: &IndexDefinition) -> EmptyResult {
        let mut con = self.con.lock().await;
        index_command(definition)
            .query_async::<_, ()>(&mut *con)
            .await?;

        Ok(())
    }
}

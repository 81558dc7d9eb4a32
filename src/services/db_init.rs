use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};

pub async fn ensure_indexes(db: &Database) -> Result<(), String> {
    // alerts: list by owner, newest first
    {
        let col = db.collection::<mongodb::bson::Document>("alerts");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(IndexOptions::builder().name("user_created".to_string()).build())
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    Ok(())
}

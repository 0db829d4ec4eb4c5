use crate::schema::{Column, ForeignKey, Schema, Table};

fn column(name: &str, typ: &str, is_nullable: Option<bool>) -> Column {
    Column {
        name: name.to_string(),
        typ: typ.to_string(),
        is_nullable,
        ..Default::default()
    }
}

/// Built-in Singers/Albums schema used by `--sample`.
pub fn sample_schema() -> Schema {
    Schema {
        tables: vec![
            Table {
                name: "Singers".to_string(),
                primary_key: Some(vec!["SingerId".to_string()]),
                columns: vec![
                    column("SingerId", "INT64", Some(false)),
                    column("FirstName", "STRING", None),
                    column("LastName", "STRING", Some(false)),
                    column("CreatedAt", "TIMESTAMP", Some(false)),
                ],
                ..Default::default()
            },
            Table {
                name: "Albums".to_string(),
                primary_key: Some(vec!["SingerId".to_string(), "AlbumId".to_string()]),
                columns: vec![
                    column("SingerId", "INT64", Some(false)),
                    column("AlbumId", "INT64", Some(false)),
                    column("AlbumTitle", "STRING", None),
                    column("ReleaseDate", "DATE", None),
                ],
                interleaved_in: Some("Singers".to_string()),
                ..Default::default()
            },
        ],
        foreign_keys: Some(vec![ForeignKey {
            name: "fk_albums_singers".to_string(),
            referencing_table: "Albums".to_string(),
            referencing_columns: vec!["SingerId".to_string()],
            referenced_table: "Singers".to_string(),
            referenced_columns: vec!["SingerId".to_string()],
        }]),
        indexes: None,
    }
}

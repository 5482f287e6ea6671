use crate::types::{AssetRow, InsertAssetParams, InsertedAsset};
use sqlx::PgPool;
use tracing::debug;

/// Fetch one image by primary key
pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<AssetRow>, sqlx::Error> {
    sqlx::query_as::<_, AssetRow>(
        r#"
        SELECT
            "FILECONTENT" AS content,
            "FILENAME" AS filename,
            "KLASSIFIKATION_1"::text AS klassifikation_1,
            "KLASSIFIKATION_2"::text AS klassifikation_2,
            to_json("DATUM_ZUORD_OK") #>> '{}' AS datum_zuord_ok,
            "FINAL_CNT_FK_INP_BELEGE_ALL"::bigint AS final_cnt_fk_inp_belege_all,
            "FINAL_CNT_FK_KON_PERSON"::bigint AS final_cnt_fk_kon_person
        FROM "COMPANY"."T_BILD_BILDER"
        WHERE "PK_BILD_BILDER" = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Insert an image and return its new primary key
pub async fn insert(pool: &PgPool, p: &InsertAssetParams) -> Result<InsertedAsset, sqlx::Error> {
    debug!(filename = %p.filename, size = p.content.len(), "Inserting image");
    sqlx::query_as::<_, InsertedAsset>(
        r#"
        INSERT INTO "COMPANY"."T_BILD_BILDER"
            ("FILECONTENT", "FILENAME", "KLASSIFIKATION_1", "KLASSIFIKATION_2")
        VALUES ($1::bytea, $2, $3, $4)
        RETURNING "PK_BILD_BILDER"::bigint AS id, "FILENAME" AS filename
        "#,
    )
    .bind(&p.content)
    .bind(&p.filename)
    .bind(&p.klassifikation_1)
    .bind(&p.klassifikation_2)
    .fetch_one(pool)
    .await
}

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::post::{CreatePostRequest, Post, UpdatePostRequest};
use deadpool_postgres::{Config, Object, Pool, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tracing::{error, info, warn};

/// PostgreSQL への接続プールを握るストレージ層。
/// Deadpool の `Pool` を内部に保持し、掲示板の CRUD 操作をメソッドとして提供する。
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// 接続プールを構築し、起動時に疎通確認まで実施する。
    /// `async fn` なので `Database::new(config).await` のように `await` が必要。
    ///
    /// # Arguments
    /// * `config` - The database configuration
    ///
    /// # Returns
    /// * `Result<Self, AppError>` - Database instance or error
    pub async fn new(config: DatabaseConfig) -> Result<Self, AppError> {
        info!(
            "Creating PostgreSQL connection pool for host: {}:{}",
            config.host, config.port
        );

        let pool = Self::create_pool(config).await?;

        // Test the connection pool
        let db = Database { pool };
        db.test_connection().await?;

        Ok(db)
    }

    /// Deadpool 用の `Config` を組み立ててプールを生成する内部関数。
    /// `match` で SSL モードを切り替え、`native_tls` で TLS コネクタを差し込んでいる。
    async fn create_pool(config: DatabaseConfig) -> Result<Pool, AppError> {
        let mut pg_config = Config::new();

        // Set connection parameters
        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        pg_config.password = Some(config.password);

        // Configure SSL mode
        match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Disable);
            }
            "prefer" => {
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Prefer);
            }
            "require" => {
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Require);
            }
            _ => {
                warn!("Unknown SSL mode '{}', defaulting to 'prefer'", config.ssl_mode);
                pg_config.ssl_mode = Some(deadpool_postgres::SslMode::Prefer);
            }
        }

        // Configure connection pool
        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        pg_config.pool = Some(deadpool_postgres::PoolConfig::new(
            config.max_connections as usize,
        ));

        let tls_connector = TlsConnector::builder().build().map_err(|e| {
            error!("Failed to create TLS connector: {}", e);
            AppError::Database(format!("TLS connector creation failed: {}", e))
        })?;
        let tls = MakeTlsConnector::new(tls_connector);

        // Create the pool with TLS support
        pg_config.create_pool(Some(Runtime::Tokio1), tls).map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            AppError::Database(format!("Connection pool creation failed: {}", e))
        })
    }

    /// プールから接続を借りる小さなラッパー。
    /// `deadpool_postgres::Pool::get` が返す `PoolError` を `AppError` に変換する。
    async fn get_connection(&self) -> Result<Object, AppError> {
        self.pool.get().await.map_err(AppError::from)
    }

    /// `SELECT 1` を投げて DB が生きているか確認する。
    pub async fn health_check(&self) -> Result<(), AppError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database health check failed: {}", e);
            AppError::Database(format!("Health check failed: {}", e))
        })?;

        Ok(())
    }

    /// アプリ起動時に `worldcup` テーブルを CREATE する簡易マイグレーター。
    /// SQL をリテラル文字列で保持しておき、`client.execute` を順番に呼び出している。
    pub async fn migrate(&self) -> Result<(), AppError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        let worldcup_table = r#"
            CREATE TABLE IF NOT EXISTS worldcup (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                image_url1 TEXT NOT NULL,
                image_url2 TEXT NOT NULL,
                image_url3 TEXT NOT NULL,
                image_url4 TEXT NOT NULL
            )
        "#;

        client.execute(worldcup_table, &[]).await.map_err(|e| {
            error!("Failed to create worldcup table: {}", e);
            AppError::Database(format!("Worldcup table creation failed: {}", e))
        })?;

        let title_index = "CREATE INDEX IF NOT EXISTS idx_worldcup_title ON worldcup(title)";
        client.execute(title_index, &[]).await.map_err(|e| {
            error!("Failed to create worldcup title index: {}", e);
            AppError::Database(format!("Worldcup title index creation failed: {}", e))
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// `Database::new` 直後にプール全体が機能するかの確認に使う。
    /// 失敗した場合は即座に `AppError::Database` を返す。
    pub async fn test_connection(&self) -> Result<(), AppError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database connection test failed: {}", e);
            AppError::Database(format!("Connection test failed: {}", e))
        })?;

        info!("Database connection test successful");
        Ok(())
    }

    // Post repository operations

    /// 投稿の作成ロジック。
    /// `CreatePostRequest::validate` で 4 枚の画像が揃っていることを検証し、
    /// INSERT ... RETURNING で採番済みのレコードを受け取る。
    pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post, AppError> {
        // Validate the request
        request.validate().map_err(AppError::Validation)?;

        let client = self.get_connection().await?;

        let query = r#"
            INSERT INTO worldcup (title, content, image_url1, image_url2, image_url3, image_url4)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, content, image_url1, image_url2, image_url3, image_url4
        "#;

        let row = client
            .query_one(
                query,
                &[
                    &request.title,
                    &request.content,
                    &request.image_urls[0],
                    &request.image_urls[1],
                    &request.image_urls[2],
                    &request.image_urls[3],
                ],
            )
            .await
            .map_err(AppError::from)?;

        let created_post = Post {
            id: row.get(0),
            title: row.get(1),
            content: row.get(2),
            image_url1: row.get(3),
            image_url2: row.get(4),
            image_url3: row.get(5),
            image_url4: row.get(6),
        };

        info!("Created post with id: {}", created_post.id);
        Ok(created_post)
    }

    /// 整数 ID で単一の投稿を取得する。
    /// `query_opt` を使うことで、存在しない場合にエラーと区別して
    /// `AppError::NotFound` を返せる。
    pub async fn get_post(&self, post_id: i32) -> Result<Post, AppError> {
        let client = self.get_connection().await?;
        let query = "SELECT id, title, content, image_url1, image_url2, image_url3, image_url4 FROM worldcup WHERE id = $1";

        let row = client
            .query_opt(query, &[&post_id])
            .await
            .map_err(AppError::from)?;

        if let Some(row) = row {
            let post = Post {
                id: row.get(0),
                title: row.get(1),
                content: row.get(2),
                image_url1: row.get(3),
                image_url2: row.get(4),
                image_url3: row.get(5),
                image_url4: row.get(6),
            };

            Ok(post)
        } else {
            Err(AppError::NotFound(format!("Post with id {}", post_id)))
        }
    }

    /// ID 昇順で全投稿を取得する。
    /// `rows.iter().map(|row| ...)` のクロージャ内で `tokio_postgres::Row` から型安全に取り出す。
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let client = self.get_connection().await?;
        let query = "SELECT id, title, content, image_url1, image_url2, image_url3, image_url4 FROM worldcup ORDER BY id";

        let rows = client.query(query, &[]).await.map_err(AppError::from)?;

        let posts: Vec<Post> = rows
            .iter()
            .map(|row| Post {
                id: row.get(0),
                title: row.get(1),
                content: row.get(2),
                image_url1: row.get(3),
                image_url2: row.get(4),
                image_url3: row.get(5),
                image_url4: row.get(6),
            })
            .collect();

        Ok(posts)
    }

    /// タイトルに部分文字列を含む投稿を検索する。
    /// パターン全体 (`%...%`) をプレースホルダに渡すので SQL には混ざらない。
    /// 大文字小文字の扱いは DB の照合順序に従う。
    pub async fn search_posts(&self, query_text: &str) -> Result<Vec<Post>, AppError> {
        let client = self.get_connection().await?;
        let query = "SELECT id, title, content, image_url1, image_url2, image_url3, image_url4 FROM worldcup WHERE title LIKE $1 ORDER BY id";

        let pattern = format!("%{}%", query_text);
        let rows = client
            .query(query, &[&pattern])
            .await
            .map_err(AppError::from)?;

        let posts: Vec<Post> = rows
            .iter()
            .map(|row| Post {
                id: row.get(0),
                title: row.get(1),
                content: row.get(2),
                image_url1: row.get(3),
                image_url2: row.get(4),
                image_url3: row.get(5),
                image_url4: row.get(6),
            })
            .collect();

        Ok(posts)
    }

    /// タイトルと本文は常に書き換え、画像は指定されたスロットだけ上書きする。
    /// SET 句を動的に組み立て、`&(dyn ToSql + Sync)` のベクタで
    /// プレースホルダに順番対応させるパターン。スロットの列名は
    /// `ImageSlot::column` 由来の固定文字列に限られる。
    pub async fn update_post(&self, request: UpdatePostRequest) -> Result<(), AppError> {
        // Validate the request
        request.validate().map_err(AppError::Validation)?;

        let client = self.get_connection().await?;

        let mut query_parts = vec!["title = $1".to_string(), "content = $2".to_string()];
        let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> =
            vec![&request.title, &request.content];
        let mut param_count = 3;

        if let Some(ref image) = request.image {
            query_parts.push(format!("{} = ${}", image.slot.column(), param_count));
            params.push(&image.filename);
            param_count += 1;
        }

        // Add WHERE clause parameter
        params.push(&request.id);

        let query = format!(
            "UPDATE worldcup SET {} WHERE id = ${}",
            query_parts.join(", "),
            param_count
        );

        client
            .execute(&query, &params)
            .await
            .map_err(AppError::from)?;

        info!("Updated post with id: {}", request.id);
        Ok(())
    }

    /// DELETE を流すだけのシンプルな処理。
    /// 対象行が存在しなくても成功扱いにする (直後の一覧へリダイレクトされる)。
    pub async fn delete_post(&self, post_id: i32) -> Result<(), AppError> {
        let client = self.get_connection().await?;
        let query = "DELETE FROM worldcup WHERE id = $1";

        client
            .execute(query, &[&post_id])
            .await
            .map_err(AppError::from)?;

        info!("Deleted post with id: {}", post_id);
        Ok(())
    }
}

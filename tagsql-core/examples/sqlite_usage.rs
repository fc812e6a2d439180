use tagsql_core::{
    delete, insert, select, transaction, update, Database, DatabaseConfig, Executor, Value,
};

tagsql_core::record! {
    #[derive(Debug, Clone, Default)]
    struct Task {
        #[column = "id"]
        id: i64,
        #[column = "title"]
        title: String,
        #[column = "done"]
        done: bool,
        #[column = "notes"]
        notes: Option<String>,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::new("sqlite::memory:").max_connections(1);
    let mut db = Database::connect(&config).await?;

    db.execute(
        "CREATE TABLE `tasks` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, `title` TEXT NOT NULL, \
         `done` INTEGER NOT NULL, `notes` TEXT)",
        &[],
    )
    .await?;

    // Insert a couple of rows inside one transaction
    transaction(&db, |tx| {
        Box::pin(async move {
            for title in ["write docs", "ship release"] {
                let task = Task {
                    title: title.to_string(),
                    ..Task::default()
                };
                insert::<Task>().into("tasks").exec(tx, &task).await?;
            }
            Ok(())
        })
    })
    .await?;

    let finished = Task {
        title: "write docs".to_string(),
        done: true,
        notes: Some("merged".to_string()),
        ..Task::default()
    };
    update("tasks")
        .set_all(&finished)
        .where_("`title` = ?")
        .exec(&mut db, &finished, &[Value::from("write docs")])
        .await?;

    let tasks = select::<Task>()
        .from(&["tasks"])
        .order_by("`id`")
        .query(&mut db, &[])
        .await?;
    for task in &tasks {
        println!("{task:?}");
    }

    let open = select::<Task>()
        .from(&["tasks"])
        .where_("`done` = ?")
        .query_row(&mut db, &[Value::Bool(false)])
        .await?;
    println!("first open task: {open:?}");

    let removed = delete("tasks").where_("`done` = ?").exec(&mut db, &[Value::Bool(true)]).await?;
    println!("removed {} finished task(s)", removed.rows_affected);

    db.close().await;
    Ok(())
}

use tagsql_core::{delete, insert, select, update, update_multiple, QueryBuilder};

tagsql_core::record! {
    #[derive(Debug, Clone, Default)]
    struct User {
        #[column = "id"]
        id: i64,
        #[column = "name"]
        name: String,
        #[column = "email"]
        email: String,
        #[column = "age"]
        age: i32,
        session_token: String,
    }
}

fn main() {
    // SELECT lists every tagged column, primary key included
    let select_query = select::<User>()
        .from(&["users"])
        .where_("`age` > ? AND `email` LIKE ?")
        .order_by("`name`")
        .limit("10");
    println!("SELECT SQL: {}", select_query.to_sql().unwrap());

    // INSERT leaves out the primary key
    let insert_query = insert::<User>().into("users");
    println!("INSERT SQL: {}", insert_query.to_sql().unwrap());

    // UPDATE of explicit columns, or of every non-key column
    let update_query = update("users").set(&["email"]).where_("`id` = ?");
    println!("UPDATE SQL: {}", update_query.to_sql().unwrap());

    let user = User::default();
    let update_all = update("users").set_all(&user).where_("`id` = ?");
    println!("UPDATE ALL SQL: {}", update_all.to_sql().unwrap());

    // Multi-table updates qualify their columns
    let joined = update_multiple(&["users", "teams"])
        .set(&["teams.name"])
        .where_("`users`.`team_id` = `teams`.`id` AND `users`.`id` = ?");
    println!("MULTI-TABLE UPDATE SQL: {}", joined.to_sql().unwrap());

    // Misuse is recorded on the builder instead of panicking
    let invalid = update_multiple(&["users", "teams"]).set_all(&user);
    println!("INVALID UPDATE: {:?}", invalid.error());

    let delete_query = delete("users").where_("`age` < ?").limit("100");
    println!("DELETE SQL: {}", delete_query.to_sql().unwrap());
}

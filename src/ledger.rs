use sqlx::SqliteConnection;

// Accounts are opened lazily with the configured starting balance.
async fn open_account(
    conn: &mut SqliteConnection,
    guild_id: &str,
    user_id: &str,
    starting_balance: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO accounts (guild_id, user_id, balance) VALUES (?, ?, ?)")
        .bind(guild_id)
        .bind(user_id)
        .bind(starting_balance)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn balance(
    conn: &mut SqliteConnection,
    guild_id: &str,
    user_id: &str,
    starting_balance: i64,
) -> Result<i64, sqlx::Error> {
    open_account(conn, guild_id, user_id, starting_balance).await?;
    sqlx::query_scalar("SELECT balance FROM accounts WHERE guild_id = ? AND user_id = ?")
        .bind(guild_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
}

/// Withdraws `amount` if the account covers it. Returns whether the debit happened.
pub async fn debit(
    conn: &mut SqliteConnection,
    guild_id: &str,
    user_id: &str,
    amount: i64,
    starting_balance: i64,
) -> Result<bool, sqlx::Error> {
    open_account(conn, guild_id, user_id, starting_balance).await?;
    let result = sqlx::query(
        "UPDATE accounts SET balance = balance - ?
         WHERE guild_id = ? AND user_id = ? AND balance >= ?",
    )
    .bind(amount)
    .bind(guild_id)
    .bind(user_id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

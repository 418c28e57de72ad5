use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Statement};

use crate::{
    domain::CodeKind,
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        customers::{Column as CustomerCol, Entity as Customers},
        invoices::{Column as InvoiceCol, Entity as Invoices},
        payments::{Column as PaymentCol, Entity as Payments},
    },
    error::AppResult,
};

/// Transaction-scoped advisory lock on `key`, released at commit or rollback.
pub async fn advisory_xact_lock<C>(conn: &C, key: &str) -> AppResult<()>
where
    C: ConnectionTrait,
{
    conn.execute(Statement::from_sql_and_values(
        conn.get_database_backend(),
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        [key.into()],
    ))
    .await?;
    Ok(())
}

/// Issue the next code of `kind` for `day`: the day prefix followed by the
/// number of codes already issued that day plus one.
///
/// Must run inside the transaction that inserts the row carrying the code.
/// The advisory lock is held until that transaction ends, so concurrent
/// issuers for the same prefix queue up instead of counting the same rows.
pub async fn next_code<C>(conn: &C, kind: CodeKind, day: NaiveDate) -> AppResult<String>
where
    C: ConnectionTrait,
{
    let prefix = kind.day_prefix(day);

    advisory_xact_lock(conn, &prefix).await?;

    let issued = match kind {
        CodeKind::Booking => {
            Bookings::find()
                .filter(BookingCol::BookingCode.starts_with(&prefix))
                .count(conn)
                .await?
        }
        CodeKind::Customer => {
            Customers::find()
                .filter(CustomerCol::CustomerCode.starts_with(&prefix))
                .count(conn)
                .await?
        }
        CodeKind::Invoice => {
            Invoices::find()
                .filter(InvoiceCol::InvoiceNumber.starts_with(&prefix))
                .count(conn)
                .await?
        }
        CodeKind::Payment => {
            Payments::find()
                .filter(PaymentCol::PaymentNumber.starts_with(&prefix))
                .count(conn)
                .await?
        }
    };

    Ok(kind.format(day, issued))
}

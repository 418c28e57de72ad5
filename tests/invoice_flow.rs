mod common;

use resort_booking_api::{
    domain::{InvoiceStatus, PaymentMethod},
    dto::{
        customers::{CreateCustomerRequest, CustomerSearchQuery},
        invoices::{AddInvoiceItemRequest, AddPaymentRequest, CreateInvoiceRequest, InvoiceDetail, RevenueQuery},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{customer_service, invoice_service},
    state::AppState,
};
use uuid::Uuid;

use common::{guest_contact, setup_state, staff};

fn payment(amount: i64) -> AddPaymentRequest {
    AddPaymentRequest {
        amount,
        payment_method: PaymentMethod::BankTransfer,
        reference_number: Some(format!("TX-{amount}")),
        notes: None,
        payment_date: None,
    }
}

async fn customer_id(state: &AppState, desk: &AuthUser, contact: CreateCustomerRequest) -> anyhow::Result<Uuid> {
    let customer = customer_service::create_customer(state, desk, contact)
        .await?
        .data
        .expect("customer");
    Ok(customer.id)
}

/// Manual invoice with a single line of 1,000,000: total 1,100,000 after VAT.
async fn invoice_of_1_100_000(state: &AppState, accountant: &AuthUser, desk: &AuthUser) -> anyhow::Result<InvoiceDetail> {
    let customer_id = customer_id(state, desk, guest_contact()).await?;
    let invoice = invoice_service::create_invoice(
        state,
        accountant,
        CreateInvoiceRequest {
            customer_id,
            booking_id: None,
            invoice_date: None,
            due_date: None,
            discount_amount: None,
            notes: Some("Spa package".into()),
        },
    )
    .await?
    .data
    .expect("invoice");
    assert_eq!(invoice.invoice.total_amount, 0);
    assert_eq!(invoice.invoice.status, InvoiceStatus::Draft);

    let detail = invoice_service::add_item(
        state,
        accountant,
        invoice.invoice.id,
        AddInvoiceItemRequest {
            item_type: "service".into(),
            item_name: "Spa".into(),
            description: None,
            quantity: 2,
            unit_price: 500_000,
        },
    )
    .await?
    .data
    .expect("invoice");
    Ok(detail)
}

#[tokio::test]
async fn payments_drive_invoice_status() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let accountant = staff(&state, "accountant").await?;
    let cashier = staff(&state, "cashier").await?;

    let invoice = invoice_of_1_100_000(&state, &accountant, &desk).await?;
    assert_eq!(invoice.invoice.subtotal, 1_000_000);
    assert_eq!(invoice.invoice.tax_amount, 100_000);
    assert_eq!(invoice.invoice.total_amount, 1_100_000);
    assert_eq!(invoice.invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.items[0].total_price, 1_000_000);
    let id = invoice.invoice.id;

    let partial = invoice_service::add_payment(&state, &cashier, id, payment(500_000))
        .await?
        .data
        .expect("invoice");
    assert_eq!(partial.invoice.status, InvoiceStatus::Partial);
    assert_eq!(partial.balance, 600_000);
    assert!(partial.payments[0].payment_number.starts_with("PAY"));

    let paid = invoice_service::add_payment(&state, &cashier, id, payment(600_000))
        .await?
        .data
        .expect("invoice");
    assert_eq!(paid.invoice.status, InvoiceStatus::Paid);
    assert_eq!(paid.paid_amount, 1_100_000);
    assert_eq!(paid.balance, 0);
    assert_ne!(paid.payments[0].payment_number, paid.payments[1].payment_number);

    let err = invoice_service::add_payment(&state, &cashier, id, payment(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Overpayment { remaining: 0 }));

    let history = invoice_service::list_payments(&state, &cashier, id)
        .await?
        .data
        .expect("payments");
    assert_eq!(history.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn invalid_payments_are_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let accountant = staff(&state, "accountant").await?;
    let invoice = invoice_of_1_100_000(&state, &accountant, &desk).await?;
    let id = invoice.invoice.id;

    for amount in [0, -5] {
        let err = invoice_service::add_payment(&state, &accountant, id, payment(amount))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let err = invoice_service::add_payment(&state, &accountant, id, payment(1_100_001))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Overpayment { remaining: 1_100_000 }));

    let err = invoice_service::add_payment(&state, &desk, id, payment(100))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = invoice_service::add_payment(&state, &accountant, Uuid::new_v4(), payment(100))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Invoice")));

    let unchanged = invoice_service::get_invoice(&state, &accountant, id)
        .await?
        .data
        .expect("invoice");
    assert!(unchanged.payments.is_empty());
    assert_eq!(unchanged.invoice.status, InvoiceStatus::Draft);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_payments_cannot_overpay() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let accountant = staff(&state, "accountant").await?;
    let invoice = invoice_of_1_100_000(&state, &accountant, &desk).await?;
    let id = invoice.invoice.id;

    let (r1, r2) = tokio::join!(
        invoice_service::add_payment(&state, &accountant, id, payment(700_000)),
        invoice_service::add_payment(&state, &accountant, id, payment(700_000)),
    );
    let outcomes = [r1, r2];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(AppError::Overpayment { remaining: 400_000 })
    )));

    let detail = invoice_service::get_invoice(&state, &accountant, id)
        .await?
        .data
        .expect("invoice");
    assert_eq!(detail.paid_amount, 700_000);
    assert_eq!(detail.invoice.status, InvoiceStatus::Partial);
    Ok(())
}

#[tokio::test]
async fn customer_invoices_and_revenue() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let accountant = staff(&state, "accountant").await?;
    let invoice = invoice_of_1_100_000(&state, &accountant, &desk).await?;
    invoice_service::add_payment(&state, &accountant, invoice.invoice.id, payment(1_100_000)).await?;

    let listed = invoice_service::invoices_for_customer(&state, &desk, invoice.invoice.customer_id)
        .await?
        .data
        .expect("invoices");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, invoice.invoice.id);

    let today = state.policy().today();
    let report = invoice_service::revenue_report(
        &state,
        &accountant,
        RevenueQuery {
            start_date: today,
            end_date: today,
        },
    )
    .await?
    .data
    .expect("report");
    assert!(report.total_invoices >= 1);
    assert!(report.paid_revenue >= 1_100_000);
    assert!(report.collected >= 1_100_000);

    let err = invoice_service::revenue_report(&state, &desk, RevenueQuery {
        start_date: today,
        end_date: today,
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn duplicate_customer_email_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let contact = guest_contact();
    let first = customer_service::create_customer(&state, &desk, contact.clone())
        .await?
        .data
        .expect("customer");
    assert!(first.customer_code.starts_with("CUS"));

    let err = customer_service::create_customer(&state, &desk, contact).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

fn spa_item(unit_price: i64) -> AddInvoiceItemRequest {
    AddInvoiceItemRequest {
        item_type: "service".into(),
        item_name: "Spa".into(),
        description: None,
        quantity: 1,
        unit_price,
    }
}

#[tokio::test]
async fn empty_invoice_stays_draft_after_recompute() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let accountant = staff(&state, "accountant").await?;
    let customer_id = customer_id(&state, &desk, guest_contact()).await?;
    let created = invoice_service::create_invoice(
        &state,
        &accountant,
        CreateInvoiceRequest {
            customer_id,
            booking_id: None,
            invoice_date: None,
            due_date: None,
            discount_amount: None,
            notes: None,
        },
    )
    .await?
    .data
    .expect("invoice");
    assert_eq!(created.invoice.status, InvoiceStatus::Draft);

    let complimentary = invoice_service::add_item(&state, &accountant, created.invoice.id, spa_item(0))
        .await?
        .data
        .expect("invoice");
    assert_eq!(complimentary.invoice.total_amount, 0);
    assert_eq!(complimentary.invoice.status, InvoiceStatus::Draft);
    Ok(())
}

#[tokio::test]
async fn oversized_item_is_rejected_without_changing_totals() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let accountant = staff(&state, "accountant").await?;
    let invoice = invoice_of_1_100_000(&state, &accountant, &desk).await?;
    let id = invoice.invoice.id;

    let err = invoice_service::add_item(&state, &accountant, id, spa_item(1_000_000_000_000_000_000))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let unchanged = invoice_service::get_invoice(&state, &accountant, id)
        .await?
        .data
        .expect("invoice");
    assert_eq!(unchanged.invoice.total_amount, 1_100_000);
    assert_eq!(unchanged.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn customer_search_ignores_case() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let mut contact = guest_contact();
    let tag = contact.email[6..16].to_string();
    contact.last_name = format!("Lan{tag}");
    let id = customer_id(&state, &desk, contact).await?;

    for q in [format!("lan{tag}"), format!("LAN{}", tag.to_uppercase())] {
        let found = customer_service::search_customers(
            &state,
            &desk,
            CustomerSearchQuery {
                q: Some(q),
                ..Default::default()
            },
        )
        .await?
        .data
        .expect("customers");
        let ids: Vec<Uuid> = found.items.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![id]);
    }
    Ok(())
}

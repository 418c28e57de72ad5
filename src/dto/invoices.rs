use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    domain::PaymentMethod,
    models::{Invoice, InvoiceItem, Payment},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub discount_amount: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddInvoiceItemRequest {
    pub item_type: String,
    pub item_name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddPaymentRequest {
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<Payment>,
    pub paid_amount: i64,
    pub balance: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceList {
    pub items: Vec<Invoice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentList {
    pub items: Vec<Payment>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RevenueQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct RevenueReport {
    pub total_invoices: i64,
    pub total_revenue: i64,
    pub paid_revenue: i64,
    pub partial_revenue: i64,
    pub pending_revenue: i64,
    pub collected: i64,
}

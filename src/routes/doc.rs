use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{BookingPaymentStatus, BookingStatus, InvoiceStatus, PaymentMethod, RoomStatus},
    dto::{
        auth::{CreateUserRequest, LoginRequest, LoginResponse},
        bookings::{
            BookingCreated, BookingDetail, BookingList, BookingSummary, CheckInRequest, CheckInResult,
            CheckOutResult, CreateBookingRequest, GuestCancelRequest, PaymentNotification,
            UpdateBookingRequest,
        },
        customers::{CreateCustomerRequest, CustomerBookings, CustomerList},
        invoices::{
            AddInvoiceItemRequest, AddPaymentRequest, CreateInvoiceRequest, InvoiceDetail,
            InvoiceList, PaymentList, RevenueReport,
        },
        rooms::{RoomList, RoomStatistics, RoomTypeList},
    },
    models::{Booking, CheckIn, Customer, Invoice, InvoiceItem, Payment, Room, RoomType, User},
    response::{ApiResponse, Meta},
    routes::{auth, bookings, customers, health, invoices, params, rooms},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::login,
        auth::create_staff_user,
        rooms::available_rooms,
        rooms::room_types,
        rooms::room_statistics,
        rooms::get_room,
        customers::create_customer,
        customers::search_customers,
        customers::get_customer,
        customers::customer_bookings,
        customers::customer_invoices,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::bookings_on_date,
        bookings::get_booking_by_code,
        bookings::guest_cancel,
        bookings::get_booking,
        bookings::update_booking,
        bookings::confirm_booking,
        bookings::cancel_booking,
        bookings::check_in,
        bookings::check_out,
        bookings::payment_notify,
        invoices::list_invoices,
        invoices::create_invoice,
        invoices::revenue_report,
        invoices::get_invoice,
        invoices::add_item,
        invoices::list_payments,
        invoices::add_payment
    ),
    components(
        schemas(
            User,
            Customer,
            RoomType,
            Room,
            Booking,
            CheckIn,
            Invoice,
            InvoiceItem,
            Payment,
            BookingStatus,
            BookingPaymentStatus,
            RoomStatus,
            InvoiceStatus,
            PaymentMethod,
            CreateUserRequest,
            LoginRequest,
            LoginResponse,
            CreateCustomerRequest,
            CustomerList,
            CustomerBookings,
            RoomList,
            RoomTypeList,
            RoomStatistics,
            CreateBookingRequest,
            UpdateBookingRequest,
            CheckInRequest,
            CheckInResult,
            CheckOutResult,
            GuestCancelRequest,
            PaymentNotification,
            BookingCreated,
            BookingDetail,
            BookingSummary,
            BookingList,
            CreateInvoiceRequest,
            AddInvoiceItemRequest,
            AddPaymentRequest,
            InvoiceDetail,
            InvoiceList,
            PaymentList,
            RevenueReport,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<BookingCreated>,
            ApiResponse<BookingDetail>,
            ApiResponse<InvoiceDetail>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Staff authentication"),
        (name = "Rooms", description = "Room types, availability and status"),
        (name = "Customers", description = "Customer records"),
        (name = "Bookings", description = "Booking lifecycle: create, confirm, cancel, check-in, check-out"),
        (name = "Invoices", description = "Invoices, line items and payments"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

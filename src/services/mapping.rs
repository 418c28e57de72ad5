use chrono::Utc;

use crate::{
    entity::{
        bookings::Model as BookingModel, check_ins::Model as CheckInModel,
        customers::Model as CustomerModel, invoice_items::Model as InvoiceItemModel,
        invoices::Model as InvoiceModel, payments::Model as PaymentModel,
        room_types::Model as RoomTypeModel, rooms::Model as RoomModel, users::Model as UserModel,
    },
    error::AppResult,
    models::{Booking, CheckIn, Customer, Invoice, InvoiceItem, Payment, Room, RoomType, User},
};

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        full_name: model.full_name,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        customer_code: model.customer_code,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        address: model.address,
        nationality: model.nationality,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn room_type_from_entity(model: RoomTypeModel) -> RoomType {
    RoomType {
        id: model.id,
        type_name: model.type_name,
        description: model.description,
        base_price: model.base_price,
        max_occupancy: model.max_occupancy,
        amenities: model.amenities,
    }
}

pub fn room_from_entity(model: RoomModel, room_type: RoomTypeModel) -> AppResult<Room> {
    Ok(Room {
        id: model.id,
        room_number: model.room_number,
        floor_number: model.floor_number,
        status: model.status.parse()?,
        notes: model.notes,
        room_type: room_type_from_entity(room_type),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn booking_from_entity(model: BookingModel) -> AppResult<Booking> {
    Ok(Booking {
        id: model.id,
        booking_code: model.booking_code,
        customer_id: model.customer_id,
        room_id: model.room_id,
        check_in_date: model.check_in_date,
        check_out_date: model.check_out_date,
        adults: model.adults,
        children: model.children,
        status: model.status.parse()?,
        payment_status: model.payment_status.parse()?,
        payment_method: model.payment_method.parse()?,
        total_amount: model.total_amount,
        deposit_amount: model.deposit_amount,
        special_requests: model.special_requests,
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn check_in_from_entity(model: CheckInModel) -> CheckIn {
    CheckIn {
        id: model.id,
        booking_id: model.booking_id,
        room_id: model.room_id,
        actual_adults: model.actual_adults,
        actual_children: model.actual_children,
        check_in_time: model.check_in_time.with_timezone(&Utc),
        check_out_time: model.check_out_time.map(|dt| dt.with_timezone(&Utc)),
        checked_in_by: model.checked_in_by,
        checked_out_by: model.checked_out_by,
    }
}

pub fn invoice_from_entity(model: InvoiceModel) -> AppResult<Invoice> {
    Ok(Invoice {
        id: model.id,
        invoice_number: model.invoice_number,
        customer_id: model.customer_id,
        booking_id: model.booking_id,
        invoice_date: model.invoice_date,
        due_date: model.due_date,
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        discount_amount: model.discount_amount,
        total_amount: model.total_amount,
        status: model.status.parse()?,
        notes: model.notes,
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn invoice_item_from_entity(model: InvoiceItemModel) -> InvoiceItem {
    InvoiceItem {
        id: model.id,
        invoice_id: model.invoice_id,
        item_type: model.item_type,
        item_name: model.item_name,
        description: model.description,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn payment_from_entity(model: PaymentModel) -> AppResult<Payment> {
    Ok(Payment {
        id: model.id,
        payment_number: model.payment_number,
        invoice_id: model.invoice_id,
        payment_date: model.payment_date,
        amount: model.amount,
        payment_method: model.payment_method.parse()?,
        reference_number: model.reference_number,
        notes: model.notes,
        processed_by: model.processed_by,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

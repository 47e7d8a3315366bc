use crate::domain::request::{RouteEndpoint, ServiceRequest};
use crate::domain::stop::StopType;
use crate::errors::{BookingError, FieldError, ValidationError};
use crate::flows::BookingStep;
use crate::journey::first_unroutable;
use crate::payload::CoordinatePolicy;

/// Local checks run before a step is formatted and sent.
///
/// Missing fields come back together as one [`ValidationError`]. Under
/// [`CoordinatePolicy::RequireResolved`] a journey stop without usable
/// coordinates blocks step 2 with [`BookingError::StaleCoordinates`] naming the
/// stop.
pub fn validate_step(
    step: BookingStep,
    values: &ServiceRequest,
    policy: CoordinatePolicy,
) -> Result<(), BookingError> {
    let mut fields = Vec::new();
    match step {
        BookingStep::Contact => contact_fields(values, &mut fields),
        BookingStep::Locations => {
            location_fields(values, &mut fields);
            if fields.is_empty() && policy == CoordinatePolicy::RequireResolved {
                ensure_resolved(values)?;
            }
        }
        BookingStep::Items => item_fields(values, &mut fields),
        BookingStep::Schedule => {
            if values.schedule.preferred_date.is_none() {
                fields.push(FieldError::new("preferred_date", "a preferred date is required"));
            }
        }
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { step, fields }.into())
    }
}

fn require(fields: &mut Vec<FieldError>, name: &str, value: &str) {
    if value.trim().is_empty() {
        fields.push(FieldError::new(name, "required"));
    }
}

fn contact_fields(values: &ServiceRequest, fields: &mut Vec<FieldError>) {
    let contact = &values.contact;
    require(fields, "contact_name", &contact.contact_name);
    require(fields, "contact_phone", &contact.contact_phone);
    require(fields, "contact_email", &contact.contact_email);
    let email = contact.contact_email.trim();
    if !email.is_empty() && !email.contains('@') {
        fields.push(FieldError::new("contact_email", "must be an email address"));
    }

    if !values.request_type.uses_journey_stops() {
        require(fields, "pickup_address", &values.pickup.address);
        require(fields, "dropoff_address", &values.dropoff.address);
    }
}

fn location_fields(values: &ServiceRequest, fields: &mut Vec<FieldError>) {
    if !values.request_type.uses_journey_stops() {
        require(fields, "pickup_address", &values.pickup.address);
        require(fields, "dropoff_address", &values.dropoff.address);
        return;
    }

    let stops = &values.journey_stops;
    if !stops.iter().any(|stop| stop.stop_type == StopType::Pickup) {
        fields.push(FieldError::new("journey_stops", "a pickup stop is required"));
    }
    if !stops.iter().any(|stop| stop.stop_type == StopType::Dropoff) {
        fields.push(FieldError::new("journey_stops", "a dropoff stop is required"));
    }
    for (index, stop) in stops.iter().enumerate() {
        if stop.location.address.trim().is_empty() {
            fields.push(FieldError::new(format!("journey_stops[{index}].address"), "required"));
        }
    }
}

fn ensure_resolved(values: &ServiceRequest) -> Result<(), BookingError> {
    let stale = |stop_index: usize, label: String| BookingError::StaleCoordinates {
        step: BookingStep::Locations,
        stop_index,
        label,
    };

    if values.request_type.uses_journey_stops() {
        if let Some((index, stop)) = first_unroutable(&values.journey_stops) {
            return Err(stale(index, stop.label()));
        }
        return Ok(());
    }

    let endpoints: [(&str, &RouteEndpoint); 2] =
        [("pickup", &values.pickup), ("dropoff", &values.dropoff)];
    for (index, (kind, endpoint)) in endpoints.into_iter().enumerate() {
        if endpoint.coordinates.is_none() {
            return Err(stale(index, format!("{kind} ({})", endpoint.address.trim())));
        }
    }
    Ok(())
}

fn item_fields(values: &ServiceRequest, fields: &mut Vec<FieldError>) {
    if values.moving_items.is_empty() {
        fields.push(FieldError::new("moving_items", "at least one item is required"));
        return;
    }
    for (index, item) in values.moving_items.iter().enumerate() {
        if item.name.trim().is_empty() {
            fields.push(FieldError::new(format!("moving_items[{index}].name"), "required"));
        }
        if item.quantity == 0 {
            fields.push(FieldError::new(
                format!("moving_items[{index}].quantity"),
                "must be at least 1",
            ));
        }
    }
}

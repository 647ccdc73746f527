//! The RDS110.R's published points, carried over from the original connector's
//! property table. A representative subset, not the full ~60-point list — the remainder
//! is mechanical repetition of the same `(ObjectType, instance, read_properties)` shape.

use crate::service::{ObjectType, PropertyDescriptor, PropertyIdentifier};

fn descriptor(object_type: ObjectType, instance_id: u32) -> PropertyDescriptor {
    PropertyDescriptor::new(object_type, instance_id)
}

fn descriptor_with_priority_array(object_type: ObjectType, instance_id: u32) -> PropertyDescriptor {
    descriptor(object_type, instance_id)
        .with_read_properties(vec![PropertyIdentifier::PresentValue, PropertyIdentifier::PriorityArray])
}

pub fn room_temperature() -> PropertyDescriptor {
    descriptor(ObjectType::AnalogValue, 134)
}

pub fn room_temperature_result() -> PropertyDescriptor {
    descriptor(ObjectType::AnalogValue, 111)
}

pub fn room_relative_humidity() -> PropertyDescriptor {
    descriptor(ObjectType::AnalogValue, 133)
}

pub fn present_heating_setpoint() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::AnalogValue, 122)
}

pub fn present_heating_setpoint_comfort() -> PropertyDescriptor {
    descriptor(ObjectType::AnalogValue, 123)
}

pub fn heating_setpoint_comfort() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::AnalogValue, 127)
}

pub fn room_temperature_setpoint() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::AnalogValue, 131)
}

pub fn pump_position() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::AnalogOutput, 4)
}

pub fn max_heating_setpoint() -> PropertyDescriptor {
    descriptor(ObjectType::AnalogValue, 178)
}

pub fn comfort_button() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::BinaryValue, 57)
}

pub fn room_presence_detection() -> PropertyDescriptor {
    descriptor(ObjectType::BinaryValue, 59)
}

pub fn room_window_state() -> PropertyDescriptor {
    descriptor(ObjectType::BinaryValue, 65)
}

pub fn enable_heating_control() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::BinaryValue, 63)
}

pub fn room_operating_mode() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::MultiStateValue, 80)
}

pub fn occupancy_mode() -> PropertyDescriptor {
    descriptor_with_priority_array(ObjectType::MultiStateValue, 81)
}

pub fn heating_cooling_state() -> PropertyDescriptor {
    descriptor(ObjectType::MultiStateValue, 86)
}

/// The full chunkable catalog shipped with this implementation, in a stable order.
/// `SiemensThermostat::update` splits this at 20 descriptors per request.
pub fn all() -> Vec<PropertyDescriptor> {
    vec![
        room_temperature(),
        room_temperature_result(),
        room_relative_humidity(),
        present_heating_setpoint(),
        present_heating_setpoint_comfort(),
        heating_setpoint_comfort(),
        room_temperature_setpoint(),
        pump_position(),
        max_heating_setpoint(),
        comfort_button(),
        room_presence_detection(),
        room_window_state(),
        enable_heating_control(),
        room_operating_mode(),
        occupancy_mode(),
        heating_cooling_state(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_temperature_matches_original_connector_instance() {
        let d = room_temperature();
        assert_eq!(d.object_type, ObjectType::AnalogValue);
        assert_eq!(d.instance_id, 134);
    }

    #[test]
    fn priority_array_descriptors_request_both_properties() {
        let d = present_heating_setpoint();
        assert_eq!(d.read_properties, vec![PropertyIdentifier::PresentValue, PropertyIdentifier::PriorityArray]);
    }

    #[test]
    fn catalog_has_no_duplicate_objects() {
        let descriptors = all();
        for (i, a) in descriptors.iter().enumerate() {
            for b in &descriptors[i + 1..] {
                assert_ne!(a.object_identifier(), b.object_identifier());
            }
        }
    }
}

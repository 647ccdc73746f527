//! Facade over the protocol core: caches the device's current state and exposes it as
//! named, typed accessors instead of raw `(ObjectIdentifier, PropertyIdentifier)` lookups.
//!
//! Grounded on the original connector's `SiemensBACnet` class: `update()` chunks the
//! catalog at 20 descriptors per request plus a trailing request for the DEVICE object's
//! `OBJECT_NAME`/`DESCRIPTION`; `get_value`/`set_value` are pure cache lookup and
//! write-then-refresh respectively.

use crate::catalog;
use crate::error::ClientError;
use crate::service::{
    DeviceState, ObjectType, PropertyDescriptor, PropertyIdentifier, PropertyValue,
};
use crate::transport::{BacnetIpTransport, ClientConfig, Tracer};

/// Descriptors requested per ReadPropertyMultiple request, matching the original
/// connector's observed chunk size.
const CHUNK_SIZE: usize = 20;

pub struct SiemensThermostat {
    transport: BacnetIpTransport,
    device_id: u32,
    state: Option<DeviceState>,
}

impl SiemensThermostat {
    pub fn connect(config: ClientConfig, device_id: u32, tracer: Tracer) -> Result<Self, ClientError> {
        let transport = BacnetIpTransport::connect(config, tracer)?;
        Ok(Self { transport, device_id, state: None })
    }

    fn device_descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor::new(ObjectType::Device, self.device_id)
            .with_read_properties(vec![PropertyIdentifier::ObjectName, PropertyIdentifier::Description])
    }

    /// Refresh the cached state: one ReadPropertyMultiple per 20-descriptor chunk of the
    /// catalog, plus a trailing request for the DEVICE object's name and description. The
    /// cache is replaced wholesale only once every chunk succeeds.
    pub fn update(&mut self) -> Result<(), ClientError> {
        let descriptors = catalog::all();
        let mut state = DeviceState::new();
        for chunk in descriptors.chunks(CHUNK_SIZE) {
            state.merge(self.transport.read_property_multiple(chunk)?);
        }
        state.merge(self.transport.read_property_multiple(&[self.device_descriptor()])?);
        self.state = Some(state);
        Ok(())
    }

    fn state(&self) -> Result<&DeviceState, ClientError> {
        self.state.as_ref().ok_or(ClientError::NotUpdated)
    }

    /// Pure lookup into the cache. `Ok(None)` means `update()` succeeded but this
    /// property was never requested or the device returned no entry for it; `Err` only
    /// when `update()` has never succeeded.
    pub fn get_value(
        &self,
        descriptor: &PropertyDescriptor,
        property: PropertyIdentifier,
    ) -> Result<Option<&PropertyValue>, ClientError> {
        Ok(self.state()?.get(descriptor.object_identifier(), property))
    }

    /// Write a property, then refresh the cache so subsequent reads see the effect.
    pub fn set_value(&mut self, descriptor: &PropertyDescriptor, value: PropertyValue) -> Result<(), ClientError> {
        self.transport.write_property(descriptor, &value)?;
        self.update()
    }

    fn present_real(&self, descriptor: PropertyDescriptor) -> Result<Option<f32>, ClientError> {
        match self.get_value(&descriptor, PropertyIdentifier::PresentValue)? {
            Some(PropertyValue::Real(v)) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    fn present_bool(&self, descriptor: PropertyDescriptor) -> Result<Option<bool>, ClientError> {
        match self.get_value(&descriptor, PropertyIdentifier::PresentValue)? {
            Some(PropertyValue::Enumerated(v)) => Ok(Some(*v != 0)),
            Some(PropertyValue::Bool(b)) => Ok(Some(*b)),
            _ => Ok(None),
        }
    }

    pub fn device_name(&self) -> Result<Option<&str>, ClientError> {
        match self.get_value(&self.device_descriptor(), PropertyIdentifier::ObjectName)? {
            Some(PropertyValue::CharString(s)) => Ok(Some(s.as_str())),
            _ => Ok(None),
        }
    }

    pub fn room_temperature(&self) -> Result<Option<f32>, ClientError> {
        self.present_real(catalog::room_temperature())
    }

    pub fn room_temperature_result(&self) -> Result<Option<f32>, ClientError> {
        self.present_real(catalog::room_temperature_result())
    }

    pub fn room_relative_humidity(&self) -> Result<Option<f32>, ClientError> {
        self.present_real(catalog::room_relative_humidity())
    }

    pub fn present_heating_setpoint(&self) -> Result<Option<f32>, ClientError> {
        self.present_real(catalog::present_heating_setpoint())
    }

    pub fn heating_setpoint_comfort(&self) -> Result<Option<f32>, ClientError> {
        self.present_real(catalog::heating_setpoint_comfort())
    }

    /// Command the comfort heating setpoint at priority 16 (the lowest manual-override
    /// priority, matching the original connector).
    pub fn set_heating_setpoint_comfort(&mut self, value: f32) -> Result<(), ClientError> {
        let descriptor = catalog::heating_setpoint_comfort().with_priority(16);
        self.set_value(&descriptor, PropertyValue::Real(value))
    }

    pub fn pump_position(&self) -> Result<Option<f32>, ClientError> {
        self.present_real(catalog::pump_position())
    }

    pub fn room_presence_detection(&self) -> Result<Option<bool>, ClientError> {
        self.present_bool(catalog::room_presence_detection())
    }

    pub fn room_window_state(&self) -> Result<Option<bool>, ClientError> {
        self.present_bool(catalog::room_window_state())
    }
}

use std::io::{Read, Write};

use bthal_proto::schema::bluetooth as op;
use bthal_proto::service::BLUETOOTH;
use bthal_proto::Bdaddr;

use crate::client::HalClient;
use crate::error::Result;
use crate::events::EventSink;

/// Adapter and remote device operations on the bluetooth service.
///
/// Results of most operations arrive later as events.
pub struct Bluetooth<'a, R, W, S> {
    client: &'a mut HalClient<R, W, S>,
}

impl<R: Read, W: Write, S: EventSink> HalClient<R, W, S> {
    pub fn bluetooth(&mut self) -> Bluetooth<'_, R, W, S> {
        Bluetooth { client: self }
    }
}

impl<R: Read, W: Write, S: EventSink> Bluetooth<'_, R, W, S> {
    pub fn init(&mut self) -> Result<()> {
        self.client.register_module(BLUETOOTH)
    }

    pub fn cleanup(&mut self) -> Result<bool> {
        self.client.unregister_module(BLUETOOTH)
    }

    pub fn enable(&mut self) -> Result<()> {
        self.call(op::ENABLE, &[])
    }

    pub fn disable(&mut self) -> Result<()> {
        self.call(op::DISABLE, &[])
    }

    pub fn get_adapter_props(&mut self) -> Result<()> {
        self.call(op::GET_ADAPTER_PROPS, &[])
    }

    pub fn get_adapter_prop(&mut self, prop_type: u8) -> Result<()> {
        self.call(op::GET_ADAPTER_PROP, &[prop_type])
    }

    pub fn get_remote_device_props(&mut self, addr: &Bdaddr) -> Result<()> {
        self.call(op::GET_REMOTE_DEVICE_PROPS, addr.octets())
    }

    pub fn start_discovery(&mut self) -> Result<()> {
        self.call(op::START_DISCOVERY, &[])
    }

    pub fn cancel_discovery(&mut self) -> Result<()> {
        self.call(op::CANCEL_DISCOVERY, &[])
    }

    pub fn create_bond(&mut self, addr: &Bdaddr) -> Result<()> {
        self.call(op::CREATE_BOND, addr.octets())
    }

    pub fn remove_bond(&mut self, addr: &Bdaddr) -> Result<()> {
        self.call(op::REMOVE_BOND, addr.octets())
    }

    pub fn cancel_bond(&mut self, addr: &Bdaddr) -> Result<()> {
        self.call(op::CANCEL_BOND, addr.octets())
    }

    pub fn dut_mode_conf(&mut self, enable: bool) -> Result<()> {
        self.call(op::DUT_MODE_CONF, &[u8::from(enable)])
    }

    fn call(&mut self, opcode: u8, payload: &[u8]) -> Result<()> {
        self.client.request(BLUETOOTH, opcode, payload).map(|_| ())
    }
}

//! Shared fixtures for mapper integration tests.

use request_mapper::mapper::{ContextHandle, HostHandle, Mapper, MappingData, WrapperHandle};

pub fn host(id: u64) -> HostHandle {
    HostHandle(id)
}

pub fn ctx(id: u64) -> ContextHandle {
    ContextHandle(id)
}

pub fn servlet(id: u64) -> WrapperHandle {
    WrapperHandle(id)
}

/// Map with no explicit version and return the filled record.
pub fn map(mapper: &Mapper, host: &str, uri: &str) -> MappingData {
    let mut data = MappingData::new();
    mapper.map(host, uri, None, &mut data);
    data
}

/// Map with an explicit context version.
#[allow(dead_code)]
pub fn map_version(mapper: &Mapper, host: &str, uri: &str, version: &str) -> MappingData {
    let mut data = MappingData::new();
    mapper.map(host, uri, Some(version), &mut data);
    data
}

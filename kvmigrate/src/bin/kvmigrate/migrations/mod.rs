//! Migration sets compiled into the `kvmigrate` binary.
//!
//! Each submodule registers itself with `inventory::submit!`; nothing here
//! needs to be referenced explicitly.

mod example;

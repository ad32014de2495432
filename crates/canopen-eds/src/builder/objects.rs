// crates/canopen-eds/src/builder/objects.rs

use crate::error::EdsError;
use crate::od::{Object, Variable, normalize_octet_string};
use crate::parser::STORAGE_LOCATION_MARKER;
use crate::types::{DataType, ObjectType};
use alloc::string::String;
use core::fmt::Write;
use log::trace;

/// Writes object sections. One instance per serialize call.
pub(super) struct ObjectWriter {
    /// Emit `Denotation` fields.
    pub dcf: bool,
    /// Emit `;StorageLocation=` markers.
    pub storage_markers: bool,
}

impl ObjectWriter {
    pub fn write_object(&self, out: &mut String, index: u16, object: &Object) -> Result<(), EdsError> {
        trace!("Writing object 0x{:04X}", index);
        match object {
            Object::Variable(v) => self.write_variable(out, index, None, v),
            Object::Array(a) => {
                self.write_container_header(
                    out,
                    index,
                    &a.comments,
                    &a.parameter_name,
                    &a.denotation,
                    ObjectType::Array,
                    a.storage_location(),
                    a.len(),
                )?;
                for (sub, variable) in a.iter() {
                    self.write_variable(out, index, Some(sub), variable)?;
                }
                Ok(())
            }
            Object::Record(r) => {
                self.write_container_header(
                    out,
                    index,
                    &r.comments,
                    &r.parameter_name,
                    &r.denotation,
                    ObjectType::Record,
                    r.storage_location(),
                    r.len(),
                )?;
                for (sub, variable) in r.iter() {
                    self.write_variable(out, index, Some(sub), variable)?;
                }
                Ok(())
            }
        }
    }

    fn write_comments(out: &mut String, comments: &str) -> Result<(), EdsError> {
        if !comments.is_empty() {
            for line in comments.split('\n') {
                writeln!(out, ";{}", line)?;
            }
        }
        Ok(())
    }

    fn write_name_lines(
        &self,
        out: &mut String,
        parameter_name: &str,
        denotation: &str,
        object_type: ObjectType,
        storage_location: &str,
    ) -> Result<(), EdsError> {
        writeln!(out, "ParameterName={}", parameter_name)?;
        if self.dcf && !denotation.is_empty() {
            writeln!(out, "Denotation={}", denotation)?;
        }
        writeln!(out, "ObjectType={}", object_type)?;
        if self.storage_markers {
            writeln!(out, ";{}={}", STORAGE_LOCATION_MARKER, storage_location)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_container_header(
        &self,
        out: &mut String,
        index: u16,
        comments: &str,
        parameter_name: &str,
        denotation: &str,
        object_type: ObjectType,
        storage_location: &str,
        sub_number: usize,
    ) -> Result<(), EdsError> {
        Self::write_comments(out, comments)?;
        writeln!(out, "[{:X}]", index)?;
        self.write_name_lines(out, parameter_name, denotation, object_type, storage_location)?;
        writeln!(out, "SubNumber={}", sub_number)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_variable(
        &self,
        out: &mut String,
        index: u16,
        subindex: Option<u8>,
        variable: &Variable,
    ) -> Result<(), EdsError> {
        Self::write_comments(out, &variable.comments)?;
        match subindex {
            None => writeln!(out, "[{:X}]", index)?,
            Some(sub) => writeln!(out, "[{:X}sub{:X}]", index, sub)?,
        }
        self.write_name_lines(
            out,
            &variable.parameter_name,
            &variable.denotation,
            ObjectType::Var,
            &variable.storage_location,
        )?;
        writeln!(out, "DataType={}", variable.data_type)?;
        writeln!(out, "AccessType={}", variable.access_type)?;
        if !variable.default_value.is_empty() {
            if variable.data_type == DataType::OctetString {
                let normalized = normalize_octet_string(&variable.default_value);
                let value = normalized.as_deref().unwrap_or(&variable.default_value);
                writeln!(out, "DefaultValue={}", value)?;
            } else {
                writeln!(out, "DefaultValue={}", variable.default_value)?;
            }
        }
        if variable.pdo_mapping {
            writeln!(out, "PDOMapping=1")?;
        }
        if !variable.low_limit.is_empty() {
            writeln!(out, "LowLimit={}", variable.low_limit)?;
        }
        if !variable.high_limit.is_empty() {
            writeln!(out, "HighLimit={}", variable.high_limit)?;
        }
        writeln!(out)?;
        Ok(())
    }
}

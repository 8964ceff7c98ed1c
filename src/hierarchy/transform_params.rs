use crate::{
    node::{GroupId, ObjectId},
    CdsError, DataArray, DataType,
};

use super::{attribute::cast_att_value, Hierarchy};

/// The user data key holding the transform parameters of a group.
const TRANSFORM_PARAMS_KEY: &str = "cds:transform_params";

/// Parameter lists keyed by object name, each holding `(parameter name, value)` pairs.
#[derive(Clone, Debug, Default)]
struct TransformParams {
    lists: Vec<(String, Vec<(String, DataArray)>)>,
}

impl TransformParams {
    fn get(&self, obj_name: &str, param_name: &str) -> Option<&DataArray> {
        let (_, params) = self.lists.iter().find(|(name, _)| name == obj_name)?;
        params
            .iter()
            .find(|(name, _)| name == param_name)
            .map(|(_, value)| value)
    }

    fn set(&mut self, obj_name: &str, param_name: &str, value: DataArray) {
        let index = match self.lists.iter().position(|(name, _)| name == obj_name) {
            Some(index) => index,
            None => {
                self.lists.push((obj_name.to_string(), Vec::new()));
                self.lists.len() - 1
            }
        };
        let params = &mut self.lists[index].1;
        match params.iter_mut().find(|(name, _)| name == param_name) {
            Some(param) => param.1 = value,
            None => params.push((param_name.to_string(), value)),
        }
    }
}

impl Hierarchy {
    /// Set a transform parameter of the object named `obj_name` on `group`.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if `group` is stale or `value` is a `string` array.
    pub fn set_transform_param(
        &mut self,
        group: GroupId,
        obj_name: &str,
        param_name: &str,
        value: DataArray,
    ) -> Result<(), CdsError> {
        if value.data_type() == DataType::String {
            return Err(CdsError::invalid(format!(
                "could not set transform parameter {obj_name}:{param_name}: unsupported data type string"
            )));
        }
        let group = self.group_mut(group)?;
        let user_data = &mut group.common.user_data;
        if let Some(params) = user_data.get_as_mut::<TransformParams>(TRANSFORM_PARAMS_KEY) {
            params.set(obj_name, param_name, value);
        } else {
            let mut params = TransformParams::default();
            params.set(obj_name, param_name, value);
            user_data.set(TRANSFORM_PARAMS_KEY, Box::new(params));
        }
        Ok(())
    }

    /// Returns a transform parameter of the object named `obj_name` defined on `group`, cast to `data_type`.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if `data_type` is `string` or the value cannot be cast.
    pub fn get_transform_param_from_group(
        &self,
        group: GroupId,
        obj_name: &str,
        param_name: &str,
        data_type: DataType,
    ) -> Result<Option<DataArray>, CdsError> {
        if data_type == DataType::String {
            return Err(CdsError::invalid(format!(
                "could not get transform parameter {obj_name}:{param_name}: unsupported data type string"
            )));
        }
        self.get_user_data_as::<TransformParams>(group, TRANSFORM_PARAMS_KEY)
            .and_then(|params| params.get(obj_name, param_name))
            .map(|value| cast_att_value(value, data_type))
            .transpose()
    }

    /// Returns a transform parameter of an object, cast to `data_type`.
    ///
    /// The parameter is looked up by the object name in the nearest group containing the object, then in each ancestor group.
    ///
    /// # Errors
    ///
    /// Returns a [`CdsError`] if `object` is stale, `data_type` is `string`, or the value cannot be cast.
    pub fn get_transform_param(
        &self,
        object: impl Into<ObjectId>,
        param_name: &str,
        data_type: DataType,
    ) -> Result<Option<DataArray>, CdsError> {
        let object = object.into();
        let obj_name = self
            .object_name(object)
            .ok_or_else(|| CdsError::not_found(self.describe(object)))?;
        let Some(group) = self.nearest_group(object) else {
            return Ok(None);
        };
        for group in self.group_lineage(group) {
            if let Some(value) =
                self.get_transform_param_from_group(group, obj_name, param_name, data_type)?
            {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Copy every transform parameter of `src_group` in `src` to `dest_group`, replacing existing values.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if `dest_group` is stale.
    pub fn copy_transform_params(
        &mut self,
        src: &Self,
        src_group: GroupId,
        dest_group: GroupId,
    ) -> Result<(), CdsError> {
        let Some(params) = src.get_user_data_as::<TransformParams>(src_group, TRANSFORM_PARAMS_KEY)
        else {
            return Ok(());
        };
        for (obj_name, list) in &params.lists {
            for (param_name, value) in list {
                self.set_transform_param(dest_group, obj_name, param_name, value.clone())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_params_lookup() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.define_group(None, "root").unwrap();
        let child = hierarchy.define_group(Some(root), "child").unwrap();
        hierarchy.define_dim(child, "time", 0, true).unwrap();
        let temp = hierarchy
            .define_var(child, "temp", crate::DataType::Float, &["time"])
            .unwrap();

        hierarchy
            .set_transform_param(root, "temp", "transform", DataArray::from("TRANS_BIN_AVERAGE"))
            .unwrap();
        hierarchy
            .set_transform_param(child, "temp", "width", DataArray::from(vec![60.0f64]))
            .unwrap();
        assert!(hierarchy
            .set_transform_param(root, "temp", "names", DataArray::from(vec!["a".to_string()]))
            .is_err());

        assert_eq!(
            hierarchy
                .get_transform_param(temp, "width", DataType::Int)
                .unwrap(),
            Some(DataArray::Int(vec![60]))
        );
        assert_eq!(
            hierarchy
                .get_transform_param(temp, "transform", DataType::Char)
                .unwrap()
                .map(|value| value.to_text()),
            Some("TRANS_BIN_AVERAGE".to_string())
        );
        assert_eq!(
            hierarchy.get_transform_param(temp, "range", DataType::Double).unwrap(),
            None
        );

        // replacing a value keeps a single entry
        hierarchy
            .set_transform_param(child, "temp", "width", DataArray::from("30"))
            .unwrap();
        assert_eq!(
            hierarchy
                .get_transform_param_from_group(child, "temp", "width", DataType::Short)
                .unwrap(),
            Some(DataArray::Short(vec![30]))
        );

        let mut other = Hierarchy::new();
        let dest = other.define_group(None, "dest").unwrap();
        other.copy_transform_params(&hierarchy, root, dest).unwrap();
        assert_eq!(
            other
                .get_transform_param_from_group(dest, "temp", "transform", DataType::Char)
                .unwrap(),
            Some(DataArray::from("TRANS_BIN_AVERAGE"))
        );
    }
}

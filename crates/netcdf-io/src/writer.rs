//! Writing in-memory datasets to NetCDF files.

use std::path::Path;

use crate::dataset::Dataset;
use crate::error::{NetCdfError, NetCdfResult};
use crate::reader::silence_hdf5_errors;

/// Fill value written in place of NaN.
pub const FILL_VALUE: f64 = 1.0e20;

/// Attributes describing the packed on-disk form. Values are written
/// unpacked, so these are dropped.
const PACKING_ATTRS: [&str; 4] = ["_FillValue", "missing_value", "scale_factor", "add_offset"];

/// Write `dataset` to `path`, replacing any existing file.
pub fn write_dataset(dataset: &Dataset, path: &Path) -> NetCdfResult<()> {
    silence_hdf5_errors();

    let dims = dataset.checked_dim_sizes()?;
    let mut file = netcdf::create(path)
        .map_err(|e| NetCdfError::Write(format!("{}: {}", path.display(), e)))?;

    for (name, &len) in &dims {
        file.add_dimension(name, len)
            .map_err(|e| NetCdfError::Write(format!("dimension {}: {}", name, e)))?;
    }

    for array in dataset.coords.values().chain(dataset.data_vars.values()) {
        let dim_names: Vec<&str> = array.dims.iter().map(String::as_str).collect();
        let mut var = file
            .add_variable::<f64>(&array.name, &dim_names)
            .map_err(|e| NetCdfError::Write(format!("variable {}: {}", array.name, e)))?;

        let has_missing = array.values.iter().any(|v| v.is_nan());
        if has_missing {
            var.set_fill_value(FILL_VALUE)
                .map_err(|e| NetCdfError::Write(format!("{} fill value: {}", array.name, e)))?;
        }

        for (name, value) in &array.attrs {
            if PACKING_ATTRS.contains(&name.as_str()) {
                continue;
            }
            var.put_attribute(name, value.to_netcdf())
                .map_err(|e| NetCdfError::Write(format!("{}:{}: {}", array.name, name, e)))?;
        }

        let values: Vec<f64> = if has_missing {
            array
                .values
                .iter()
                .map(|&v| if v.is_nan() { FILL_VALUE } else { v })
                .collect()
        } else {
            array.values.clone()
        };
        var.put_values(&values, ..)
            .map_err(|e| NetCdfError::Write(format!("{} values: {}", array.name, e)))?;
    }

    for (name, value) in &dataset.attrs {
        file.add_attribute(name, value.to_netcdf())
            .map_err(|e| NetCdfError::Write(format!("global {}: {}", name, e)))?;
    }

    tracing::debug!(
        path = %path.display(),
        variables = dataset.data_vars.len(),
        "Wrote NetCDF dataset"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DataArray;
    use crate::attrs::{text_attr, AttrValue};
    use crate::dataset::DatasetSource;
    use crate::reader::NetCdfDataset;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.attrs.insert("model_id".to_string(), "bcc-csm1-1".into());
        ds.attrs.insert("realization".to_string(), AttrValue::Integer(1));

        let mut time = DataArray::coordinate("time", vec![0.0, 1.0]);
        time.attrs.insert("units".to_string(), "days since 2000-01-01".into());
        ds.add_coord(time);
        ds.add_coord(DataArray::coordinate("lat", vec![10.0, 20.0, 30.0]));

        let mut tas = DataArray::new(
            "tas",
            vec!["time".into(), "lat".into()],
            vec![2, 3],
            vec![270.0, f64::NAN, 272.0, 273.0, 274.0, 275.0],
        )
        .unwrap();
        tas.attrs.insert("units".to_string(), "K".into());
        tas.attrs.insert("scale_factor".to_string(), AttrValue::Number(0.01));
        ds.add_data_var(tas);
        ds
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nc");
        write_dataset(&sample(), &path).unwrap();

        let reopened = NetCdfDataset::open(path.to_str().unwrap()).unwrap();
        assert_eq!(text_attr(reopened.attrs(), "model_id"), Some("bcc-csm1-1"));
        assert_eq!(reopened.dim_sizes()["lat"], 3);

        let tas = reopened.variable("tas").unwrap();
        assert_eq!(text_attr(&tas.attrs, "units"), Some("K"));
        assert!(!tas.attrs.contains_key("scale_factor"));
        assert!(tas.coords.contains_key("time"));

        let loaded = tas.load().unwrap();
        assert!(loaded.values[1].is_nan());
        assert_eq!(loaded.values[5], 275.0);
    }
}

//! CSV row stream for placed object instances.

use std::io::{self, Write};

use crate::objects::ObjectInstance;

/// Writes the instance table with the columns
/// `id,name,model,px,py,wx,wy,wz,yaw,scale,biome`.
///
/// Instances without a model get a `PLACEHOLDER:<name>` marker so the
/// consumer can substitute proxy assets.
pub fn write_objects_csv<W: Write>(out: &mut W, objects: &[ObjectInstance]) -> io::Result<()> {
    writeln!(out, "id,name,model,px,py,wx,wy,wz,yaw,scale,biome")?;
    for inst in objects {
        let model = if inst.model.is_empty() {
            format!("PLACEHOLDER:{}", inst.name)
        } else {
            inst.model.clone()
        };
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            inst.id,
            inst.name,
            model,
            inst.cell_x,
            inst.cell_y,
            inst.world_x,
            inst.world_y,
            inst.world_z,
            inst.yaw,
            inst.scale,
            inst.biome
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: u32, model: &str) -> ObjectInstance {
        ObjectInstance {
            id,
            name: "oak".to_string(),
            model: model.to_string(),
            cell_x: 3,
            cell_y: 4,
            world_x: 3.5,
            world_y: 4.5,
            world_z: 0.5,
            yaw: 90.0,
            scale: 1.25,
            biome: "Grassland".to_string(),
        }
    }

    #[test]
    fn rows_follow_the_column_order() {
        let mut out = Vec::new();
        write_objects_csv(&mut out, &[instance(0, "models/oak.glb")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,name,model,px,py,wx,wy,wz,yaw,scale,biome"
        );
        assert_eq!(
            lines.next().unwrap(),
            "0,oak,models/oak.glb,3,4,3.5,4.5,0.5,90,1.25,Grassland"
        );
    }

    #[test]
    fn empty_model_becomes_placeholder() {
        let mut out = Vec::new();
        write_objects_csv(&mut out, &[instance(1, "")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("PLACEHOLDER:oak"));
    }
}

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub path: String,
    pub compressed: bool,
    pub file_version: Option<String>,
    pub scene_nodes: usize,
    pub geometry_nodes: usize,
    pub instance_nodes: usize,
    pub scene_materials: usize,
    pub node_library: usize,
    pub material_library: usize,
    pub geometry_library: usize,
    pub image_library: usize,
}

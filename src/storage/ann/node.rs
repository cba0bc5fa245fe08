//! Graph node.

/// A point in the graph with its adjacency on every layer it occupies.
///
/// `layers[0]` is the base layer every node lives on; `layers[n]` holds the
/// sparser express links.
#[derive(Debug, Clone)]
pub struct Node {
    pub vector: Vec<f32>,
    pub layers: Vec<Vec<u32>>,
}

impl Node {
    pub fn new(vector: Vec<f32>, level: usize) -> Self {
        Self {
            vector,
            layers: vec![Vec::new(); level + 1],
        }
    }

    pub fn neighbors(&self, layer: usize) -> &[u32] {
        self.layers.get(layer).map_or(&[], Vec::as_slice)
    }

    /// Adds a link unless it is already present. Returns the new degree.
    pub fn add_neighbor(&mut self, layer: usize, id: u32) -> usize {
        match self.layers.get_mut(layer) {
            Some(links) => {
                if !links.contains(&id) {
                    links.push(id);
                }
                links.len()
            },
            None => 0,
        }
    }

    pub fn set_neighbors(&mut self, layer: usize, ids: Vec<u32>) {
        if let Some(links) = self.layers.get_mut(layer) {
            *links = ids;
        }
    }
}

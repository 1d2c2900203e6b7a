use crate::data::geojson::DEFAULT_LAYER;
use crate::plugins::base::PluginTrait;
use crate::prelude::{Arc, HashMap};
use crate::{MapError, Result};

/// Ordered, duplicate-free list of source layers requested from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LayerSet {
    tags: Vec<String>,
}

impl LayerSet {
    /// Keeps the first occurrence of each tag.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for tag in tags {
            let tag = tag.into();
            if !set.tags.contains(&tag) {
                set.tags.push(tag);
            }
        }
        set
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// `roads,buildings`, or `all` for an empty set.
    pub fn url_segment(&self) -> String {
        if self.tags.is_empty() {
            DEFAULT_LAYER.to_string()
        } else {
            self.tags.join(",")
        }
    }

    /// Filesystem-safe form of [`url_segment`](Self::url_segment).
    pub fn file_stem(&self) -> String {
        self.url_segment().replace(',', "_")
    }

    /// The only tag, when exactly one layer is requested.
    pub fn single(&self) -> Option<&str> {
        match self.tags.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

/// Fixed set of stages with their dependency graph resolved to indices.
///
/// The graph is validated once, here: duplicate names, unknown dependencies
/// and cycles are rejected so a per-tile run can never meet them.
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn PluginTrait>>,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl PluginRegistry {
    pub fn new(plugins: Vec<Arc<dyn PluginTrait>>) -> Result<Self> {
        let mut index: HashMap<String, usize> = HashMap::default();
        for (i, plugin) in plugins.iter().enumerate() {
            if index.insert(plugin.name().to_string(), i).is_some() {
                return Err(MapError::DuplicatePlugin(plugin.name().to_string()));
            }
        }

        let mut dependencies = vec![Vec::new(); plugins.len()];
        let mut dependents = vec![Vec::new(); plugins.len()];
        for (i, plugin) in plugins.iter().enumerate() {
            for dependency in plugin.dependencies() {
                let Some(&dep) = index.get(&dependency) else {
                    return Err(MapError::MissingDependency {
                        plugin: plugin.name().to_string(),
                        dependency,
                    });
                };
                if !dependencies[i].contains(&dep) {
                    dependencies[i].push(dep);
                    dependents[dep].push(i);
                }
            }
        }

        if let Some(cycle) = find_cycle(&dependencies) {
            let names = cycle
                .into_iter()
                .map(|i| plugins[i].name().to_string())
                .collect();
            return Err(MapError::DependencyCycle(names));
        }

        log::debug!(
            "registered {} plugins: {}",
            plugins.len(),
            plugins.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            plugins,
            dependencies,
            dependents,
        })
    }

    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn plugin(&self, index: usize) -> &Arc<dyn PluginTrait> {
        &self.plugins[index]
    }

    pub fn plugins(&self) -> &[Arc<dyn PluginTrait>] {
        &self.plugins
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Indices of the stages `index` waits for.
    pub fn dependencies_of(&self, index: usize) -> &[usize] {
        &self.dependencies[index]
    }

    /// Indices of the stages waiting for `index`.
    pub fn dependents_of(&self, index: usize) -> &[usize] {
        &self.dependents[index]
    }

    /// Distinct layer tags of all stages, in registration order.
    pub fn layers(&self) -> LayerSet {
        LayerSet::from_tags(self.plugins.iter().filter_map(|p| p.layer()))
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<Arc<dyn PluginTrait>>,
}

impl PluginRegistryBuilder {
    pub fn register<P: PluginTrait + 'static>(self, plugin: P) -> Self {
        self.register_arc(Arc::new(plugin))
    }

    pub fn register_arc(mut self, plugin: Arc<dyn PluginTrait>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn build(self) -> Result<PluginRegistry> {
        PluginRegistry::new(self.plugins)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Finished,
}

/// Returns one dependency cycle as a path that starts and ends on the same
/// node, or `None` for an acyclic graph.
fn find_cycle(dependencies: &[Vec<usize>]) -> Option<Vec<usize>> {
    fn visit(
        node: usize,
        dependencies: &[Vec<usize>],
        marks: &mut [Mark],
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        marks[node] = Mark::InProgress;
        path.push(node);
        for &dep in &dependencies[node] {
            match marks[dep] {
                Mark::InProgress => {
                    let start = path.iter().position(|&n| n == dep).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(dep, dependencies, marks, path) {
                        return Some(cycle);
                    }
                }
                Mark::Finished => {}
            }
        }
        path.pop();
        marks[node] = Mark::Finished;
        None
    }

    let mut marks = vec![Mark::Unvisited; dependencies.len()];
    let mut path = Vec::new();
    for node in 0..dependencies.len() {
        if marks[node] == Mark::Unvisited {
            if let Some(cycle) = visit(node, dependencies, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

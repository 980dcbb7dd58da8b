use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::RetrievalPathInput;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathRole {
    Endpoint,
    Intermediate,
}

/// Call-graph hops the search backend returned for a query, by function name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetrievalPath {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
    pub matched: Vec<String>,
}

impl From<&RetrievalPathInput> for RetrievalPath {
    fn from(input: &RetrievalPathInput) -> Self {
        Self {
            nodes: input.nodes.clone(),
            edges: input
                .edges
                .iter()
                .map(|edge| (edge.from.clone(), edge.to.clone()))
                .collect(),
            matched: input.matched.clone(),
        }
    }
}

impl RetrievalPath {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.matched.is_empty()
    }

    /// Matched names, or the first and last hop when the backend sent none.
    fn endpoints(&self) -> Vec<&str> {
        if !self.matched.is_empty() {
            return self.matched.iter().map(String::as_str).collect();
        }
        let mut endpoints = Vec::new();
        if let Some(first) = self.nodes.first() {
            endpoints.push(first.as_str());
        }
        if let Some(last) = self.nodes.last()
            && self.nodes.len() > 1
        {
            endpoints.push(last.as_str());
        }
        endpoints
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PathMarks {
    pub roles: HashMap<usize, PathRole>,
    /// Indices into the rendered edge list.
    pub edges: HashSet<usize>,
}

/// Resolves a retrieval path against a rendered call graph.
///
/// An edge counts as on the path when the backend listed it, or when both of
/// its ends are path nodes. When the backend sent endpoints but no hops, the
/// hops are filled in with the shortest directed route between consecutive
/// endpoints.
pub(in crate::app) fn mark_path(
    path: &RetrievalPath,
    index_by_name: &HashMap<String, Vec<usize>>,
    edges: &[(usize, usize)],
    node_count: usize,
) -> PathMarks {
    let mut marks = PathMarks::default();

    let endpoints = path.endpoints();
    for name in &endpoints {
        for &index in indices_of(index_by_name, name) {
            marks.roles.insert(index, PathRole::Endpoint);
        }
    }

    for name in &path.nodes {
        for &index in indices_of(index_by_name, name) {
            marks.roles.entry(index).or_insert(PathRole::Intermediate);
        }
    }

    if path.nodes.is_empty() && path.edges.is_empty() {
        let outgoing = adjacency(edges, node_count);
        for pair in endpoints.windows(2) {
            let from = indices_of(index_by_name, pair[0]).first();
            let to = indices_of(index_by_name, pair[1]).first();
            let (Some(&from), Some(&to)) = (from, to) else {
                continue;
            };
            for index in shortest_route(&outgoing, from, to) {
                marks.roles.entry(index).or_insert(PathRole::Intermediate);
            }
        }
    }

    let listed = path
        .edges
        .iter()
        .flat_map(|(from, to)| {
            let targets = indices_of(index_by_name, to);
            indices_of(index_by_name, from)
                .iter()
                .flat_map(move |&source| targets.iter().map(move |&target| (source, target)))
        })
        .collect::<HashSet<_>>();

    for (edge_index, &(from, to)) in edges.iter().enumerate() {
        let both_on_path = marks.roles.contains_key(&from) && marks.roles.contains_key(&to);
        if listed.contains(&(from, to)) || both_on_path {
            marks.edges.insert(edge_index);
        }
    }

    marks
}

fn indices_of<'m>(index_by_name: &'m HashMap<String, Vec<usize>>, name: &str) -> &'m [usize] {
    index_by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
}

fn adjacency(edges: &[(usize, usize)], node_count: usize) -> Vec<Vec<usize>> {
    let mut outgoing = vec![Vec::new(); node_count];
    for &(from, to) in edges {
        if from < node_count && to < node_count {
            outgoing[from].push(to);
        }
    }
    outgoing
}

/// Breadth-first route from `start` to `target`, both included. Empty when unreachable.
fn shortest_route(outgoing: &[Vec<usize>], start: usize, target: usize) -> Vec<usize> {
    let count = outgoing.len();
    if start >= count || target >= count {
        return Vec::new();
    }
    if start == target {
        return vec![start];
    }

    let mut queue = VecDeque::from([start]);
    let mut visited = vec![false; count];
    let mut parent = vec![usize::MAX; count];
    visited[start] = true;

    while let Some(node) = queue.pop_front() {
        if node == target {
            break;
        }
        for &next in &outgoing[node] {
            if !visited[next] {
                visited[next] = true;
                parent[next] = node;
                queue.push_back(next);
            }
        }
    }

    if !visited[target] {
        return Vec::new();
    }

    let mut route = vec![target];
    let mut cursor = target;
    while cursor != start {
        let prev = parent[cursor];
        if prev == usize::MAX {
            break;
        }
        route.push(prev);
        cursor = prev;
    }
    route.reverse();
    route
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[&str]) -> HashMap<String, Vec<usize>> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| ((*name).to_owned(), vec![index]))
            .collect()
    }

    #[test]
    fn explicit_hops_and_endpoint_pairs_are_both_on_path() {
        let names = index(&["a", "b", "c", "d"]);
        let edges = [(0, 1), (1, 2), (0, 2), (2, 3)];
        let path = RetrievalPath {
            nodes: vec!["a".into(), "b".into(), "c".into()],
            edges: vec![("a".into(), "b".into())],
            matched: vec!["a".into(), "c".into()],
        };

        let marks = mark_path(&path, &names, &edges, 4);
        assert_eq!(marks.roles.get(&0), Some(&PathRole::Endpoint));
        assert_eq!(marks.roles.get(&1), Some(&PathRole::Intermediate));
        assert_eq!(marks.roles.get(&2), Some(&PathRole::Endpoint));
        assert!(!marks.roles.contains_key(&3));
        assert_eq!(marks.edges, HashSet::from([0, 1, 2]));
    }

    #[test]
    fn endpoints_fall_back_to_first_and_last_hop() {
        let names = index(&["a", "b", "c"]);
        let path = RetrievalPath {
            nodes: vec!["a".into(), "b".into(), "c".into()],
            ..RetrievalPath::default()
        };
        let marks = mark_path(&path, &names, &[(0, 1), (1, 2)], 3);
        assert_eq!(marks.roles.get(&0), Some(&PathRole::Endpoint));
        assert_eq!(marks.roles.get(&1), Some(&PathRole::Intermediate));
        assert_eq!(marks.roles.get(&2), Some(&PathRole::Endpoint));
    }

    #[test]
    fn bare_endpoints_are_joined_by_the_shortest_route() {
        let names = index(&["a", "b", "c", "d"]);
        let edges = [(0, 1), (1, 3), (0, 2), (2, 1)];
        let path = RetrievalPath {
            matched: vec!["a".into(), "d".into()],
            ..RetrievalPath::default()
        };
        let marks = mark_path(&path, &names, &edges, 4);
        assert_eq!(marks.roles.get(&1), Some(&PathRole::Intermediate));
        assert!(!marks.roles.contains_key(&2));
        assert_eq!(marks.edges, HashSet::from([0, 1]));
    }

    #[test]
    fn unknown_names_are_ignored() {
        let names = index(&["a"]);
        let path = RetrievalPath {
            nodes: vec!["zzz".into()],
            edges: vec![("zzz".into(), "a".into())],
            matched: vec!["yyy".into()],
        };
        let marks = mark_path(&path, &names, &[], 1);
        assert!(marks.roles.is_empty());
        assert!(marks.edges.is_empty());
    }
}

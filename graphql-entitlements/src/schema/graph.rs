//! A graph of every field reachable from the root operation types of a schema.
//!
//! Each node stands for a field, except for the two origins standing for the `query` and
//! `mutation` roots. A named type is only expanded once: every later field returning that type
//! is linked to the same children as the first one. Recursive types therefore make the graph
//! cyclic, and traversals must keep track of the nodes on their current path.
use std::collections::HashMap;
use std::collections::VecDeque;
use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::name;
use itertools::Itertools;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::scope::Scope;
use super::scope::ScopeAttachment;
use super::scope::scopes_of;
use crate::error::EntitlementError;

pub(crate) const QUERY_ORIGIN: &str = "query";
pub(crate) const MUTATION_ORIGIN: &str = "mutation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    /// The field name, or `query`/`mutation` for origins.
    pub name: String,
    /// The named type of the field, list and non-null wrappers removed.
    pub type_name: String,
    /// Field scopes first, then the scopes of the field's type.
    pub scopes: Vec<Scope>,
    pub origin: bool,
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)?;
        if self.origin {
            f.write_str("*")?;
        }
        for scope in &self.scopes {
            write!(f, " @{}", scope.name)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SchemaGraph {
    graph: DiGraph<SchemaNode, ()>,
    origins: Vec<NodeIndex>,
    /// Nodes in the order the builder processed them. Shared nodes are listed each time they
    /// are reached.
    visited: Vec<NodeIndex>,
}

/// What the builder needs from a type definition.
struct TypeDefinition<'a> {
    directives: &'a ast::DirectiveList,
    fields: &'a [Node<ast::FieldDefinition>],
}

impl<'a> TypeDefinition<'a> {
    fn leaf(directives: &'a ast::DirectiveList) -> Self {
        Self {
            directives,
            fields: &[],
        }
    }
}

impl SchemaGraph {
    pub fn build(schema: &ast::Document) -> Result<Self, EntitlementError> {
        let mut definitions = HashMap::new();
        let mut query_type = name!(Query);
        let mut mutation_type = name!(Mutation);

        for definition in &schema.definitions {
            let (name, definition) = match definition {
                ast::Definition::ObjectTypeDefinition(def) => (
                    &def.name,
                    TypeDefinition {
                        directives: &def.directives,
                        fields: &def.fields,
                    },
                ),
                ast::Definition::InterfaceTypeDefinition(def) => (
                    &def.name,
                    TypeDefinition {
                        directives: &def.directives,
                        fields: &def.fields,
                    },
                ),
                ast::Definition::InputObjectTypeDefinition(def) => {
                    (&def.name, TypeDefinition::leaf(&def.directives))
                }
                ast::Definition::UnionTypeDefinition(def) => {
                    (&def.name, TypeDefinition::leaf(&def.directives))
                }
                ast::Definition::EnumTypeDefinition(def) => {
                    (&def.name, TypeDefinition::leaf(&def.directives))
                }
                ast::Definition::ScalarTypeDefinition(def) => {
                    (&def.name, TypeDefinition::leaf(&def.directives))
                }
                ast::Definition::SchemaDefinition(def) => {
                    for root_operation in &def.root_operations {
                        let (operation_type, type_name) = &**root_operation;
                        match operation_type {
                            ast::OperationType::Query => query_type = type_name.clone(),
                            ast::OperationType::Mutation => mutation_type = type_name.clone(),
                            ast::OperationType::Subscription => {}
                        }
                    }
                    continue;
                }
                // extensions, directive definitions and executable definitions
                _ => continue,
            };
            definitions.insert(name.to_string(), definition);
        }

        let mut builder = GraphBuilder {
            definitions,
            graph: DiGraph::new(),
            origins: Vec::new(),
            visited: Vec::new(),
            expanded_types: HashMap::new(),
        };
        builder.add_origin(QUERY_ORIGIN, &query_type)?;
        builder.add_origin(MUTATION_ORIGIN, &mutation_type)?;
        builder.expand()?;

        Ok(SchemaGraph {
            graph: builder.graph,
            origins: builder.origins,
            visited: builder.visited,
        })
    }

    /// The `query` and `mutation` origins, for the root types the schema defines.
    pub fn origins(&self) -> &[NodeIndex] {
        &self.origins
    }

    pub fn node(&self, index: NodeIndex) -> &SchemaNode {
        &self.graph[index]
    }

    /// The children of `index`, in field declaration order.
    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks outgoing edges from the most recently added one
        self.graph
            .edges(index)
            .sorted_by_key(|edge| edge.id())
            .map(|edge| edge.target())
            .collect()
    }

    /// Every node reached while building, in processing order.
    pub fn nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.visited.iter().map(|index| &self.graph[*index])
    }
}

impl fmt::Display for SchemaGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, (index, node)) in self.visited.iter().zip(self.nodes()).enumerate() {
            if position > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{node}")?;
            let children = self.children(*index);
            if !children.is_empty() {
                write!(
                    f,
                    " -> [{}]",
                    children.iter().map(|child| &self.graph[*child].name).join(", ")
                )?;
            }
        }
        Ok(())
    }
}

struct GraphBuilder<'a> {
    definitions: HashMap<String, TypeDefinition<'a>>,
    graph: DiGraph<SchemaNode, ()>,
    origins: Vec<NodeIndex>,
    visited: Vec<NodeIndex>,
    /// The node that expanded each type, its children are shared with every other node of the
    /// same type.
    expanded_types: HashMap<String, NodeIndex>,
}

impl GraphBuilder<'_> {
    fn add_origin(&mut self, name: &str, type_name: &Name) -> Result<(), EntitlementError> {
        let Some(definition) = self.definitions.get(type_name.as_str()) else {
            tracing::debug!(%type_name, "no root type, skipping the {name} origin");
            return Ok(());
        };
        let scopes = scopes_on(definition.directives, ScopeAttachment::Type, type_name)?;
        let index = self.graph.add_node(SchemaNode {
            name: name.to_string(),
            type_name: type_name.to_string(),
            scopes,
            origin: true,
        });
        self.origins.push(index);
        Ok(())
    }

    fn expand(&mut self) -> Result<(), EntitlementError> {
        let mut queue: VecDeque<NodeIndex> = self.origins.iter().copied().collect();

        while let Some(index) = queue.pop_front() {
            self.visited.push(index);
            let type_name = self.graph[index].type_name.clone();

            if let Some(expanded) = self.expanded_types.get(&type_name) {
                let children: Vec<_> = self
                    .graph
                    .edges(*expanded)
                    .sorted_by_key(|edge| edge.id())
                    .map(|edge| edge.target())
                    .collect();
                for child in children {
                    self.graph.add_edge(index, child, ());
                }
                continue;
            }

            let Some(definition) = self.definitions.get(type_name.as_str()) else {
                // built-in scalars, and types the schema does not define
                continue;
            };
            if definition.fields.is_empty() {
                continue;
            }

            tracing::trace!(%type_name, fields = definition.fields.len(), "expanding type");
            let fields = definition.fields;
            for field in fields {
                let child = self.field_node(field)?;
                let child = self.graph.add_node(child);
                self.graph.add_edge(index, child, ());
                queue.push_back(child);
            }
            self.expanded_types.insert(type_name, index);
        }

        tracing::debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "built schema graph"
        );
        Ok(())
    }

    fn field_node(&self, field: &ast::FieldDefinition) -> Result<SchemaNode, EntitlementError> {
        let type_name = field.ty.inner_named_type();
        let mut scopes = scopes_on(&field.directives, ScopeAttachment::Field, &field.name)?;
        if let Some(definition) = self.definitions.get(type_name.as_str()) {
            scopes.extend(scopes_on(
                definition.directives,
                ScopeAttachment::Type,
                type_name,
            )?);
        }

        Ok(SchemaNode {
            name: field.name.to_string(),
            type_name: type_name.to_string(),
            scopes,
            origin: false,
        })
    }
}

/// [`scopes_of`], naming the type or field carrying an invalid directive.
fn scopes_on(
    directives: &ast::DirectiveList,
    attachment: ScopeAttachment,
    owner: &str,
) -> Result<Vec<Scope>, EntitlementError> {
    scopes_of(directives, attachment).map_err(|error| match error {
        EntitlementError::InvalidScope { message } => EntitlementError::InvalidScope {
            message: format!("{message} (on `{owner}`)"),
        },
        error => error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(sdl: &str) -> SchemaGraph {
        let document = ast::Document::parse(sdl, "schema.graphql").unwrap();
        SchemaGraph::build(&document).unwrap()
    }

    #[test]
    fn types_are_expanded_once_and_shared() {
        let graph = build(
            r#"
            type Query {
                posts: [Post!]!
                author: Author
            }

            type Post {
                title: String
                author: Author
            }

            type Author @scope(name: "authors", query: true) {
                name: String
                posts: [Post]
            }
            "#,
        );

        insta::assert_snapshot!(graph, @r###"
        query: Query* -> [posts, author]
        posts: Post -> [title, author]
        author: Author @authors -> [name, posts]
        title: String
        author: Author @authors -> [name, posts]
        name: String
        posts: Post -> [title, author]
        "###);

        assert_eq!(
            graph.nodes().map(|node| node.name.as_str()).collect::<Vec<_>>(),
            vec!["query", "posts", "author", "title", "author", "name", "posts"]
        );

        let query = graph.origins()[0];
        let [posts, author] = <[_; 2]>::try_from(graph.children(query)).unwrap();
        let post_author = graph.children(posts)[1];
        // both `author` fields share the children computed for the first `Author`
        assert_ne!(author, post_author);
        assert_eq!(graph.children(author), graph.children(post_author));
        // and the cycle goes back to the very same `author` node
        let author_posts = graph.children(author)[1];
        assert_eq!(graph.children(author_posts)[1], post_author);
    }

    #[test]
    fn origins_carry_root_type_scopes() {
        let graph = build(
            r#"
            type Query @scope(name: "reader", query: true) { a: String }
            type Mutation { b: String }
            "#,
        );
        let [query, mutation] = <[_; 2]>::try_from(graph.origins()).unwrap();
        assert_eq!(graph.node(query).name, "query");
        assert!(graph.node(query).origin);
        assert_eq!(graph.node(query).scopes[0].attachment, ScopeAttachment::Type);
        assert_eq!(graph.node(mutation).name, "mutation");
        assert!(graph.node(mutation).scopes.is_empty());
    }

    #[test]
    fn missing_root_types_have_no_origin() {
        let graph = build("type Query { a: String }");
        assert_eq!(graph.origins().len(), 1);
        assert_eq!(graph.node(graph.origins()[0]).name, "query");
    }

    #[test]
    fn schema_definition_names_the_root_types() {
        let graph = build(
            r#"
            schema { query: Root mutation: Change }
            type Root { a: String }
            type Change { b: String }
            "#,
        );
        let names: Vec<_> = graph
            .origins()
            .iter()
            .map(|origin| graph.node(*origin).type_name.as_str())
            .collect();
        assert_eq!(names, vec!["Root", "Change"]);
    }

    #[test]
    fn field_scopes_come_before_type_scopes() {
        let graph = build(
            r#"
            type Query { a: A @scope(name: "field") }
            type A @scope(name: "type") { b: String }
            "#,
        );
        let a = graph.children(graph.origins()[0])[0];
        let scopes: Vec<_> = graph
            .node(a)
            .scopes
            .iter()
            .map(|scope| (scope.name.as_str(), scope.attachment))
            .collect();
        assert_eq!(
            scopes,
            vec![("field", ScopeAttachment::Field), ("type", ScopeAttachment::Type)]
        );
    }

    #[test]
    fn invalid_scopes_name_their_owner() {
        let document =
            ast::Document::parse("type Query { a: String @scope }", "schema.graphql").unwrap();
        let error = SchemaGraph::build(&document).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid @scope directive: the `name` argument must be a non-empty string (on `a`)"
        );
    }
}

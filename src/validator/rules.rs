use crate::ast::environment::Environment;
use crate::ast::node::{Node, NodeId, NodeKind};
use crate::validator::Level;

/// Reserved words of the language. Names checked by `nameIsNotKeyword` must
/// not appear here.
pub const RESERVED_WORDS: &[&str] = &[
    ".",
    ",",
    "(",
    ")",
    ";",
    "_",
    "{",
    "}",
    ":",
    "+",
    "=",
    "=>",
    "import",
    "package",
    "program",
    "test",
    "mixed with",
    "class",
    "inherits",
    "object",
    "mixin",
    "var",
    "const",
    "override",
    "method",
    "native",
    "constructor",
    "self",
    "super",
    "new",
    "if",
    "else",
    "return",
    "throw",
    "try",
    "then always",
    "catch",
    "null",
    "false",
    "true",
];

/// A named predicate over nodes of one kind. `holds` returning `false`
/// produces a `Problem` with this rule's code and level.
pub(super) struct Rule {
    pub(super) code: &'static str,
    pub(super) level: Level,
    pub(super) holds: fn(&Environment, &Node) -> bool,
}

const NO_RULES: &[Rule] = &[];

const CLASS_RULES: &[Rule] = &[
    Rule {
        code: "nameIsPascalCase",
        level: Level::Warning,
        holds: name_is_pascal_case,
    },
    Rule {
        code: "methodsHaveDistinctSignatures",
        level: Level::Error,
        holds: methods_have_distinct_signatures,
    },
];

const MIXIN_RULES: &[Rule] = &[Rule {
    code: "nameIsPascalCase",
    level: Level::Warning,
    holds: name_is_pascal_case,
}];

const SINGLETON_RULES: &[Rule] = &[
    Rule {
        code: "nameIsCamelCase",
        level: Level::Warning,
        holds: name_is_camel_case,
    },
    Rule {
        code: "singletonIsNotUnnamed",
        level: Level::Error,
        holds: singleton_is_not_unnamed,
    },
];

const PARAMETER_RULES: &[Rule] = &[Rule {
    code: "nameIsCamelCase",
    level: Level::Warning,
    holds: name_is_camel_case,
}];

const VARIABLE_RULES: &[Rule] = &[
    Rule {
        code: "nameIsCamelCase",
        level: Level::Warning,
        holds: name_is_camel_case,
    },
    Rule {
        code: "nameIsNotKeyword",
        level: Level::Error,
        holds: name_is_not_keyword,
    },
];

const REFERENCE_RULES: &[Rule] = &[Rule {
    code: "nameIsNotKeyword",
    level: Level::Error,
    holds: name_is_not_keyword,
}];

const METHOD_RULES: &[Rule] = &[
    Rule {
        code: "nameIsNotKeyword",
        level: Level::Error,
        holds: name_is_not_keyword,
    },
    Rule {
        code: "onlyLastParameterIsVarArg",
        level: Level::Error,
        holds: only_last_parameter_is_var_arg,
    },
    Rule {
        code: "methodNotOnlyCallToSuper",
        level: Level::Warning,
        holds: method_not_only_call_to_super,
    },
];

const TRY_RULES: &[Rule] = &[Rule {
    code: "hasCatchOrAlways",
    level: Level::Error,
    holds: has_catch_or_always,
}];

const IMPORT_RULES: &[Rule] = &[Rule {
    code: "importHasNotLocalReference",
    level: Level::Error,
    holds: import_has_not_local_reference,
}];

const ASSIGNMENT_RULES: &[Rule] = &[Rule {
    code: "nonAsignationOfFullyQualifiedReferences",
    level: Level::Error,
    holds: non_asignation_of_fully_qualified_references,
}];

const FIELD_RULES: &[Rule] = &[Rule {
    code: "fieldNameDifferentFromTheMethods",
    level: Level::Error,
    holds: field_name_different_from_the_methods,
}];

const CONSTRUCTOR_RULES: &[Rule] = &[Rule {
    code: "constructorsHaveDistinctArity",
    level: Level::Error,
    holds: constructors_have_distinct_arity,
}];

const TEST_RULES: &[Rule] = &[Rule {
    code: "testIsNotEmpty",
    level: Level::Warning,
    holds: test_is_not_empty,
}];

const PROGRAM_RULES: &[Rule] = &[Rule {
    code: "programIsNotEmpty",
    level: Level::Warning,
    holds: program_is_not_empty,
}];

/// The per-kind rule table. Exhaustive on purpose: a new node kind fails to
/// compile until it is given an entry, even an empty one.
pub(super) fn rules_for(kind: NodeKind) -> &'static [Rule] {
    match kind {
        NodeKind::Class => CLASS_RULES,
        NodeKind::Mixin => MIXIN_RULES,
        NodeKind::Singleton => SINGLETON_RULES,
        NodeKind::Parameter => PARAMETER_RULES,
        NodeKind::Variable => VARIABLE_RULES,
        NodeKind::Reference => REFERENCE_RULES,
        NodeKind::Method => METHOD_RULES,
        NodeKind::Try => TRY_RULES,
        NodeKind::Import => IMPORT_RULES,
        NodeKind::Assignment => ASSIGNMENT_RULES,
        NodeKind::Field => FIELD_RULES,
        NodeKind::Constructor => CONSTRUCTOR_RULES,
        NodeKind::Test => TEST_RULES,
        NodeKind::Program => PROGRAM_RULES,
        NodeKind::Environment
        | NodeKind::Package
        | NodeKind::Body
        | NodeKind::Return
        | NodeKind::SelfRef
        | NodeKind::Super
        | NodeKind::New
        | NodeKind::Literal
        | NodeKind::Send
        | NodeKind::If
        | NodeKind::Throw
        | NodeKind::Catch
        | NodeKind::Describe => NO_RULES,
    }
}

fn name_is_pascal_case(_: &Environment, node: &Node) -> bool {
    match node.name() {
        Some(name) => name.chars().next().is_some_and(|first| first.is_ascii_uppercase()),
        None => true,
    }
}

fn name_is_camel_case(_: &Environment, node: &Node) -> bool {
    match node.name() {
        Some(name) => name.chars().next().is_some_and(|first| first.is_ascii_lowercase()),
        // Unnamed singletons are out of this rule's reach.
        None => true,
    }
}

fn name_is_not_keyword(_: &Environment, node: &Node) -> bool {
    match node.name() {
        Some(name) => !RESERVED_WORDS.contains(&name),
        None => true,
    }
}

fn only_last_parameter_is_var_arg(environment: &Environment, node: &Node) -> bool {
    let Node::Method { parameters, .. } = node else {
        return true;
    };
    let var_arg_positions: Vec<usize> = parameters
        .iter()
        .enumerate()
        .filter(|&(_, &parameter)| is_var_arg(environment, parameter))
        .map(|(position, _)| position)
        .collect();
    var_arg_positions.is_empty() || var_arg_positions == [parameters.len() - 1]
}

fn has_catch_or_always(environment: &Environment, node: &Node) -> bool {
    let Node::Try {
        body,
        catches,
        always,
        ..
    } = node
    else {
        return true;
    };
    !catches.is_empty()
        || (always.is_some_and(|block| !body_is_empty(environment, block))
            && !body_is_empty(environment, *body))
}

fn singleton_is_not_unnamed(environment: &Environment, node: &Node) -> bool {
    let Node::Singleton { id, name, .. } = node else {
        return true;
    };
    match environment.parent_of(*id) {
        Some(Node::Package { .. }) => name.is_some(),
        _ => true,
    }
}

fn import_has_not_local_reference(environment: &Environment, node: &Node) -> bool {
    let Node::Import { id, reference, .. } = node else {
        return true;
    };
    let Node::Reference { name: imported, .. } = environment.node(*reference) else {
        return true;
    };
    let Some(Node::Package { members, .. }) = environment.parent_of(*id) else {
        return true;
    };
    members
        .iter()
        .all(|&member| environment.node(member).name() != Some(imported.as_str()))
}

fn non_asignation_of_fully_qualified_references(environment: &Environment, node: &Node) -> bool {
    let Node::Assignment { reference, .. } = node else {
        return true;
    };
    match environment.node(*reference) {
        Node::Reference { name, .. } => !name.contains('.'),
        _ => true,
    }
}

fn field_name_different_from_the_methods(environment: &Environment, node: &Node) -> bool {
    let Node::Field { id, name, .. } = node else {
        return true;
    };
    let members = match environment.parent_of(*id) {
        Some(Node::Class { members, .. })
        | Some(Node::Singleton { members, .. })
        | Some(Node::Mixin { members, .. })
        | Some(Node::Describe { members, .. }) => members,
        _ => return true,
    };
    members.iter().all(|&member| {
        !matches!(environment.node(member), Node::Method { name: method_name, .. } if method_name == name)
    })
}

fn methods_have_distinct_signatures(environment: &Environment, node: &Node) -> bool {
    let Node::Class { members, .. } = node else {
        return true;
    };
    let methods: Vec<&Node> = members
        .iter()
        .map(|&member| environment.node(member))
        .filter(|member| matches!(member, Node::Method { .. }))
        .collect();
    for first in &methods {
        for second in &methods {
            if first.id() == second.id() {
                continue;
            }
            let (
                Node::Method {
                    name: first_name,
                    parameters: first_parameters,
                    ..
                },
                Node::Method {
                    name: second_name,
                    parameters: second_parameters,
                    ..
                },
            ) = (first, second)
            else {
                continue;
            };
            if first_name == second_name
                && have_compatible_arity(environment, first_parameters, second_parameters)
            {
                return false;
            }
        }
    }
    true
}

fn constructors_have_distinct_arity(environment: &Environment, node: &Node) -> bool {
    let Node::Constructor { id, parameters, .. } = node else {
        return true;
    };
    let members = match environment.parent_of(*id) {
        Some(Node::Class { members, .. }) => members,
        _ => return true,
    };
    members
        .iter()
        .filter_map(|&member| match environment.node(member) {
            Node::Constructor {
                id: other,
                parameters: other_parameters,
                ..
            } if other != id => Some(other_parameters),
            _ => None,
        })
        .all(|other_parameters| !have_compatible_arity(environment, parameters, other_parameters))
}

fn method_not_only_call_to_super(environment: &Environment, node: &Node) -> bool {
    let Node::Method { body, .. } = node else {
        return true;
    };
    let Some(body) = body else {
        return true;
    };
    let Node::Body { sentences, .. } = environment.node(*body) else {
        return true;
    };
    !(sentences.len() == 1 && matches!(environment.node(sentences[0]), Node::Super { .. }))
}

fn test_is_not_empty(environment: &Environment, node: &Node) -> bool {
    match node {
        Node::Test { body, .. } => !body_is_empty(environment, *body),
        _ => true,
    }
}

fn program_is_not_empty(environment: &Environment, node: &Node) -> bool {
    match node {
        Node::Program { body, .. } => !body_is_empty(environment, *body),
        _ => true,
    }
}

/// Overload clash: `second` can be reached with `first`'s parameter count,
/// either because the counts match or because `second`'s trailing varargs
/// absorbs the difference (varargs may also absorb nothing).
fn have_compatible_arity(
    environment: &Environment,
    first: &[NodeId],
    second: &[NodeId],
) -> bool {
    let second_absorbs = second
        .last()
        .is_some_and(|&parameter| is_var_arg(environment, parameter));
    (second_absorbs && first.len() + 1 >= second.len()) || first.len() == second.len()
}

fn is_var_arg(environment: &Environment, parameter: NodeId) -> bool {
    matches!(
        environment.node(parameter),
        Node::Parameter { is_var_arg: true, .. }
    )
}

fn body_is_empty(environment: &Environment, body: NodeId) -> bool {
    matches!(environment.node(body), Node::Body { sentences, .. } if sentences.is_empty())
}

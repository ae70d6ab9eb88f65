//! Declaration specs for each generated layer.
//!
//! Every layer turns the project config into a list of [`SyncJob`]s. The
//! jobs only describe what must exist; running them twice is a no-op and
//! hand-written additions to the generated files survive.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::declaration::{DeclarationSpec, MemberSpec};
use crate::generator::config::{EntityConfig, FieldConfig, ProjectConfig};
use crate::generator::naming::EntityNames;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Model,
    Repository,
    Usecase,
    Handler,
    Routes,
    Registry,
}

impl Layer {
    /// Every layer in generation order.
    pub fn all() -> Vec<Layer> {
        vec![
            Layer::Model,
            Layer::Repository,
            Layer::Usecase,
            Layer::Handler,
            Layer::Routes,
            Layer::Registry,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Model => "model",
            Layer::Repository => "repository",
            Layer::Usecase => "usecase",
            Layer::Handler => "handler",
            Layer::Routes => "routes",
            Layer::Registry => "registry",
        }
    }

    pub fn jobs(&self, config: &ProjectConfig) -> Vec<SyncJob> {
        let error_type = config.project.error_type.as_str();
        match self {
            Layer::Model => per_entity(config, model_jobs),
            Layer::Repository => per_entity(config, |e| repository_jobs(e, error_type)),
            Layer::Usecase => per_entity(config, |e| usecase_jobs(e, error_type)),
            Layer::Handler => per_entity(config, handler_jobs),
            Layer::Routes => routes_jobs(&config.entities),
            Layer::Registry => registry_jobs(&config.entities),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One declaration to sync, with its path relative to the output directory.
#[derive(Debug, Clone)]
pub struct SyncJob {
    pub layer: Layer,
    pub entity: Option<String>,
    pub path: PathBuf,
    pub spec: DeclarationSpec,
}

impl SyncJob {
    fn new(layer: Layer, entity: Option<&str>, path: impl Into<PathBuf>, spec: DeclarationSpec) -> Self {
        Self {
            layer,
            entity: entity.map(str::to_string),
            path: path.into(),
            spec,
        }
    }
}

fn per_entity(config: &ProjectConfig, build: impl Fn(&EntityConfig) -> Vec<SyncJob>) -> Vec<SyncJob> {
    config.entities.iter().flat_map(build).collect()
}

fn field_member(field: &FieldConfig) -> MemberSpec {
    match &field.tag {
        Some(tag) => MemberSpec::tagged_field(&field.name, &field.ty, tag),
        None => MemberSpec::field(&field.name, &field.ty),
    }
}

fn model_jobs(entity: &EntityConfig) -> Vec<SyncJob> {
    let names = EntityNames::new(&entity.name);
    let spec = DeclarationSpec::structure(&names.camel)
        .doc(&format!("A {} record.", names.snake.replace('_', " ")))
        .attribute("derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)")
        .import("serde::{Deserialize, Serialize}")
        .members(entity.fields.iter().map(field_member));
    vec![SyncJob::new(
        Layer::Model,
        Some(&entity.name),
        format!("model/{}.rs", names.snake),
        spec,
    )]
}

fn repository_jobs(entity: &EntityConfig, error_type: &str) -> Vec<SyncJob> {
    let names = EntityNames::new(&entity.name);
    let model = names.camel.as_str();
    let spec = DeclarationSpec::interface(&format!("{model}Repository"))
        .doc(&format!("Storage access for [`{model}`]."))
        .import(&format!("crate::model::{}::{model}", names.snake))
        .member(MemberSpec::method(
            "create",
            &[&format!("item: {model}")],
            &[&format!("Result<{model}, {error_type}>")],
        ))
        .member(MemberSpec::method(
            "find_by_id",
            &["id: &str"],
            &[&format!("Result<Option<{model}>, {error_type}>")],
        ))
        .member(MemberSpec::method(
            "list",
            &[],
            &[&format!("Result<Vec<{model}>, {error_type}>")],
        ))
        .member(MemberSpec::method(
            "update",
            &[&format!("item: {model}")],
            &[&format!("Result<{model}, {error_type}>")],
        ))
        .member(MemberSpec::method(
            "delete",
            &["id: &str"],
            &[&format!("Result<(), {error_type}>")],
        ));
    vec![SyncJob::new(
        Layer::Repository,
        Some(&entity.name),
        format!("repository/{}.rs", names.snake),
        spec,
    )]
}

fn usecase_jobs(entity: &EntityConfig, error_type: &str) -> Vec<SyncJob> {
    let names = EntityNames::new(&entity.name);
    let model = names.camel.as_str();
    let usecase = format!("{model}Usecase");
    let repo = format!("Arc<dyn {model}Repository>");
    let path = format!("usecase/{}.rs", names.snake);
    let imports = [
        "std::sync::Arc".to_string(),
        format!("crate::model::{}::{model}", names.snake),
        format!("crate::repository::{}::{model}Repository", names.snake),
    ];

    let mut structure = DeclarationSpec::structure(&usecase)
        .doc(&format!("Application logic for [`{model}`]."))
        .attribute("derive(Clone)")
        .member(MemberSpec::private_field("repo", &repo));
    for import in &imports {
        structure = structure.import(import);
    }

    let constructor = DeclarationSpec::constructor(&format!("new_{}_usecase", names.snake), &usecase)
        .member(MemberSpec::param("repo", &repo))
        .member(MemberSpec::key_value("repo", "repo"));

    let method = |name: &str, param: Option<(&str, &str)>, returns: String, call: String| {
        let mut spec = DeclarationSpec::method(&usecase, name)
            .returns(&returns)
            .body_stmt(&call);
        if let Some((param_name, param_ty)) = param {
            spec = spec.member(MemberSpec::param(param_name, param_ty));
        }
        spec
    };
    let methods = [
        method(
            "create",
            Some(("item", model)),
            format!("Result<{model}, {error_type}>"),
            "self.repo.create(item)".to_string(),
        ),
        method(
            "get",
            Some(("id", "&str")),
            format!("Result<Option<{model}>, {error_type}>"),
            "self.repo.find_by_id(id)".to_string(),
        ),
        method(
            "list",
            None,
            format!("Result<Vec<{model}>, {error_type}>"),
            "self.repo.list()".to_string(),
        ),
        method(
            "update",
            Some(("item", model)),
            format!("Result<{model}, {error_type}>"),
            "self.repo.update(item)".to_string(),
        ),
        method(
            "delete",
            Some(("id", "&str")),
            format!("Result<(), {error_type}>"),
            "self.repo.delete(id)".to_string(),
        ),
    ];

    let mut jobs = vec![
        SyncJob::new(Layer::Usecase, Some(&entity.name), &path, structure),
        SyncJob::new(Layer::Usecase, Some(&entity.name), &path, constructor),
    ];
    jobs.extend(
        methods
            .into_iter()
            .map(|spec| SyncJob::new(Layer::Usecase, Some(&entity.name), &path, spec)),
    );
    jobs
}

fn handler_jobs(entity: &EntityConfig) -> Vec<SyncJob> {
    let names = EntityNames::new(&entity.name);
    let model = names.camel.as_str();
    let handler = format!("{model}Handler");
    let usecase = format!("{model}Usecase");
    let path = format!("handler/{}.rs", names.snake);

    let structure = DeclarationSpec::structure(&handler)
        .doc(&format!("Request handler for [`{model}`]."))
        .import(&format!("crate::usecase::{}::{usecase}", names.snake))
        .member(MemberSpec::private_field("usecase", &usecase));
    let constructor = DeclarationSpec::constructor(&format!("new_{}_handler", names.snake), &handler)
        .member(MemberSpec::param("usecase", &usecase))
        .member(MemberSpec::key_value("usecase", "usecase"));
    let route = DeclarationSpec::method(&handler, "path")
        .returns("&'static str")
        .body_stmt(&format!("{:?}", names.route_path()));

    vec![
        SyncJob::new(Layer::Handler, Some(&entity.name), &path, structure),
        SyncJob::new(Layer::Handler, Some(&entity.name), &path, constructor),
        SyncJob::new(Layer::Handler, Some(&entity.name), &path, route),
    ]
}

fn routes_jobs(entities: &[EntityConfig]) -> Vec<SyncJob> {
    let router = DeclarationSpec::structure("Router")
        .doc("Route table of the service.")
        .attribute("derive(Debug, Default)")
        .member(MemberSpec::field("routes", "Vec<(&'static str, &'static str)>"));
    let register = DeclarationSpec::method("&mut Router", "register_routes").members(
        entities.iter().map(|entity| {
            let names = EntityNames::new(&entity.name);
            MemberSpec::statement(&format!(
                "self.routes.push(({:?}, {:?}));",
                names.route_path(),
                names.snake
            ))
        }),
    );
    vec![
        SyncJob::new(Layer::Routes, None, "routes.rs", router),
        SyncJob::new(Layer::Routes, None, "routes.rs", register),
    ]
}

fn registry_jobs(entities: &[EntityConfig]) -> Vec<SyncJob> {
    let tables = DeclarationSpec::structure("Tables")
        .doc("Storage table of every entity.")
        .members(entities.iter().map(|entity| {
            MemberSpec::field(&EntityNames::new(&entity.name).snake, "&'static str")
        }));
    let registry = DeclarationSpec::variable("TABLES", "Tables")
        .members(entities.iter().map(|entity| {
            let names = EntityNames::new(&entity.name);
            let table = entity.table.clone().unwrap_or_else(|| names.plural.clone());
            MemberSpec::key_value(&names.snake, &format!("{table:?}"))
        }));
    vec![
        SyncJob::new(Layer::Registry, None, "registry.rs", tables),
        SyncJob::new(Layer::Registry, None, "registry.rs", registry),
    ]
}

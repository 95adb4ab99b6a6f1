use jsonapi_core::{
    IncludedPolicy, JsonApi, JsonApiError, Linked, Registry, RelationshipField, Resource,
    ResourceRef, ResourceType, Shape,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct User {
    #[serde(skip)]
    id: Option<String>,
    name: String,
    email: String,
    #[serde(skip)]
    manager: Option<ResourceRef<User>>,
}

const USER_FIELDS: &[RelationshipField] = &[RelationshipField::to_one("manager")];

impl Resource for User {
    fn resource_type(&self) -> &str {
        Self::TYPE
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn relationship_fields(&self) -> &'static [RelationshipField] {
        USER_FIELDS
    }

    fn linked(&self, name: &str) -> Option<Linked> {
        (name == "manager").then(|| Linked::ToOne(self.manager.map(ResourceRef::erase)))
    }

    fn bind(&mut self, name: &str, linked: Linked) -> Result<(), JsonApiError> {
        if name == "manager" {
            self.manager = linked.into_one()?;
        }
        Ok(())
    }
}

impl ResourceType for User {
    const TYPE: &'static str = "users";
}

fn main() -> miette::Result<()> {
    let document = r#"{
        "data": {
            "type": "users",
            "id": "1",
            "attributes": { "name": "John Doe", "email": "john.doe@example.com" },
            "relationships": { "manager": { "data": { "type": "users", "id": "2" } } }
        },
        "included": [{
            "type": "users",
            "id": "2",
            "attributes": { "name": "Jane Roe", "email": "jane.roe@example.com" }
        }]
    }"#;

    let registry = Registry::builder().register_type::<User>().build()?;
    let api = JsonApi::new(registry);

    let document = api.read_document_named(document, "example.json", Shape::Single)?;
    if let Some(data) = document.as_data() {
        if let Some(user) = data.primary::<User>() {
            let manager = user.manager.map(|manager| data.graph[manager].name.as_str());
            println!("{} reports to {}", user.name, manager.unwrap_or("nobody"));
        }
    }

    let json_output = api.write_document_pretty(&document, IncludedPolicy::Compute)?;
    println!("Re-encoded document:\n{json_output}");
    Ok(())
}

use std::collections::HashMap;
use std::fmt;

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pub age: u32,
}

pub enum Role {
    Admin,
    Guest,
}

impl User {
    pub fn new(name: &str, age: u32) -> Self {
        User {
            name: name.to_string(),
            age,
        }
    }

    pub fn greeting(&self) -> String {
        format!("hello {}", self.name)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.age)
    }
}

fn index(users: &[User]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, user) in users.iter().enumerate() {
        map.insert(user.name.clone(), i);
    }
    map
}

pub fn main() {
    let users = vec![User::new("ada", 36)];
    let map = index(&users);
    println!("{}", map.len());
}

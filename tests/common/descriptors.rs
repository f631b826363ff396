//! Scenario and group descriptors shared by integration tests.

/// Two-template lab: a database and a web server on one private network.
pub const LAB_SCENARIO: &str = "\
name: lab
instances:
  - name: db
    image: ubuntu
    size: small
  - name: web_front
    image: ubuntu
    size: micro
networks:
  - name: net
    netmask: 255.255.255.0
    start-ip: 10.0.0.1
    end-ip: 10.0.0.100
    connects:
      - host: db
        ip: 10.0.0.2
      - host: web_front
        ip: 10.0.0.3
";

/// Group with two members, the second flagged permanent.
pub const G1_GROUP: &str = "\
name: g1
users:
  - name: alice
  - name: bob.smith
    permanent: true
    ssh-key: ssh-ed25519 AAAA
";

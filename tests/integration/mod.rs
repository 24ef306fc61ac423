// Integration tests module

#[cfg(test)]
mod facade_test;


#[cfg(test)]
mod preferences_test;

#[cfg(test)]
mod registration_test;

#[cfg(test)]
mod router_test;
